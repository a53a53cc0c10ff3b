//! Conversion from whitespace-separated text points to binary records.

use std::io::{BufRead, Write};

use crate::error::{DecodeError, DecodeResult};
use crate::format::{FIELD_COUNT, RecordFormat};

/// Convert `x y z [r g b a]` text lines into binary records.
///
/// Missing color fields default to 1.0, fields beyond the seventh are
/// ignored, and blank lines are skipped. Returns the number of records
/// written.
pub fn convert_text<R: BufRead, W: Write>(
    reader: R,
    mut writer: W,
    format: RecordFormat,
) -> DecodeResult<u64> {
    let mut written = 0u64;
    let mut record = Vec::with_capacity(format.record_size());

    for (line_index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| DecodeError::io("read text points", e))?;
        let mut fields = [1.0f64; FIELD_COUNT];
        let mut parsed = 0;

        for (slot, token) in fields.iter_mut().zip(line.split_whitespace()) {
            *slot = token.parse().map_err(|_| DecodeError::InvalidFormat {
                context: "text points",
                detail: format!("line {}: '{token}' is not a number", line_index + 1),
            })?;
            parsed += 1;
        }

        if parsed == 0 {
            continue;
        }
        if parsed < 3 {
            return Err(DecodeError::InvalidFormat {
                context: "text points",
                detail: format!(
                    "line {}: expected at least 3 coordinates, got {parsed}",
                    line_index + 1
                ),
            });
        }

        record.clear();
        format.pack(&fields, &mut record);
        writer
            .write_all(&record)
            .map_err(|e| DecodeError::io("write point records", e))?;
        written += 1;
    }

    writer
        .flush()
        .map_err(|e| DecodeError::io("flush point records", e))?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Precision;

    #[test]
    fn test_convert_full_records() {
        let text = "1 2 3 0.1 0.2 0.3 1\n4 5 6 0.4 0.5 0.6 0.5\n";
        let format = RecordFormat::new(Precision::Double);
        let mut out = Vec::new();

        let count = convert_text(text.as_bytes(), &mut out, format).unwrap();
        assert_eq!(count, 2);
        assert_eq!(out.len(), 2 * 56);
        assert_eq!(format.unpack(&out[56..])[2], 6.0);
    }

    #[test]
    fn test_convert_defaults_color_and_skips_blank() {
        let text = "1 2 3\n\n   \n7 8 9 0.5\n";
        let format = RecordFormat::new(Precision::Single);
        let mut out = Vec::new();

        let count = convert_text(text.as_bytes(), &mut out, format).unwrap();
        assert_eq!(count, 2);
        assert_eq!(format.unpack(&out[..28]), [1.0, 2.0, 3.0, 1.0, 1.0, 1.0, 1.0]);
        assert_eq!(format.unpack(&out[28..]), [7.0, 8.0, 9.0, 0.5, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_convert_rejects_garbage() {
        let text = "1 2 3\n1 two 3\n";
        let result = convert_text(text.as_bytes(), Vec::new(), RecordFormat::default());
        match result {
            Err(DecodeError::InvalidFormat { detail, .. }) => assert!(detail.contains("line 2")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_convert_rejects_short_line() {
        let text = "1 2\n";
        let result = convert_text(text.as_bytes(), Vec::new(), RecordFormat::default());
        assert!(matches!(result, Err(DecodeError::InvalidFormat { .. })));
    }
}
