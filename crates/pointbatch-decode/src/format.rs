//! Record layout.

/// Number of fields in every record: `X, Y, Z, R, G, B, A`.
pub const FIELD_COUNT: usize = 7;

/// Width of every field in a point file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precision {
    /// 32-bit little-endian floats.
    Single,
    /// 64-bit little-endian floats.
    #[default]
    Double,
}

impl Precision {
    /// Select a precision from the `single-precision` flag.
    #[must_use]
    pub fn from_single_flag(single: bool) -> Self {
        if single { Self::Single } else { Self::Double }
    }

    /// Size of one field in bytes.
    #[must_use]
    pub fn field_width(self) -> usize {
        match self {
            Self::Single => 4,
            Self::Double => 8,
        }
    }
}

/// The externally agreed shape of the records in a point file.
///
/// Point files are not self-describing, so this must be supplied with every
/// decode call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordFormat {
    /// Field width shared by the whole file.
    pub precision: Precision,
}

impl RecordFormat {
    #[must_use]
    pub fn new(precision: Precision) -> Self {
        Self { precision }
    }

    /// Size of one record in bytes.
    #[must_use]
    pub fn record_size(self) -> usize {
        self.precision.field_width() * FIELD_COUNT
    }

    /// Unpack one record into its seven fields.
    ///
    /// `bytes` must be exactly [`record_size`](Self::record_size) long.
    #[must_use]
    pub(crate) fn unpack(self, bytes: &[u8]) -> [f32; FIELD_COUNT] {
        let mut fields = [0.0f32; FIELD_COUNT];
        match self.precision {
            Precision::Single => {
                for (field, chunk) in fields.iter_mut().zip(bytes.chunks_exact(4)) {
                    *field = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                }
            }
            Precision::Double => {
                for (field, chunk) in fields.iter_mut().zip(bytes.chunks_exact(8)) {
                    let mut raw = [0u8; 8];
                    raw.copy_from_slice(chunk);
                    // Narrowing matches the f32 output buffers.
                    #[allow(clippy::cast_possible_truncation)]
                    {
                        *field = f64::from_le_bytes(raw) as f32;
                    }
                }
            }
        }
        fields
    }

    /// Pack seven fields into `out` using this format.
    pub fn pack(self, fields: &[f64; FIELD_COUNT], out: &mut Vec<u8>) {
        for &value in fields {
            match self.precision {
                #[allow(clippy::cast_possible_truncation)]
                Precision::Single => out.extend_from_slice(&(value as f32).to_le_bytes()),
                Precision::Double => out.extend_from_slice(&value.to_le_bytes()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_sizes() {
        assert_eq!(RecordFormat::new(Precision::Single).record_size(), 28);
        assert_eq!(RecordFormat::new(Precision::Double).record_size(), 56);
    }

    #[test]
    fn test_single_flag() {
        assert_eq!(Precision::from_single_flag(true), Precision::Single);
        assert_eq!(Precision::from_single_flag(false), Precision::Double);
    }

    #[test]
    fn test_unpack_double() {
        let format = RecordFormat::new(Precision::Double);
        let mut bytes = Vec::new();
        format.pack(&[1.0, -2.5, 3.25, 0.1, 0.2, 0.3, 1.0], &mut bytes);
        assert_eq!(bytes.len(), 56);

        let fields = format.unpack(&bytes);
        assert_eq!(fields[0], 1.0);
        assert_eq!(fields[1], -2.5);
        assert_eq!(fields[2], 3.25);
        assert!((fields[4] - 0.2).abs() < 1e-7);
        assert_eq!(fields[6], 1.0);
    }

    #[test]
    fn test_unpack_single() {
        let format = RecordFormat::new(Precision::Single);
        let mut bytes = Vec::new();
        format.pack(&[7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0], &mut bytes);
        assert_eq!(bytes.len(), 28);
        assert_eq!(format.unpack(&bytes), [7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0]);
    }
}
