//! Positioned reads over a file of fixed-size records.

use std::{
    fs::File,
    io::{self, Read, Seek, SeekFrom},
    path::Path,
};

use crate::error::{DecodeError, DecodeResult};
use crate::format::RecordFormat;

/// An open point file.
///
/// The handle is owned for the lifetime of this value only; decode calls open
/// a `RecordFile`, read what they need, and drop it before returning.
#[derive(Debug)]
pub struct RecordFile {
    file: File,
    format: RecordFormat,
    record_count: u64,
}

impl RecordFile {
    /// Open a point file and compute its record count from the file size.
    ///
    /// Trailing bytes that do not form a whole record are ignored.
    pub fn open(path: impl AsRef<Path>, format: RecordFormat) -> DecodeResult<Self> {
        let file = File::open(path.as_ref()).map_err(|e| DecodeError::io("open point file", e))?;
        let size = file
            .metadata()
            .map_err(|e| DecodeError::io("read point file metadata", e))?
            .len();
        let record_count = size / record_size_u64(format);

        Ok(Self {
            file,
            format,
            record_count,
        })
    }

    /// Record count of the file at `path`, without keeping it open.
    pub fn count_records(path: impl AsRef<Path>, format: RecordFormat) -> DecodeResult<u64> {
        Self::open(path, format).map(|file| file.record_count())
    }

    #[must_use]
    pub fn record_count(&self) -> u64 {
        self.record_count
    }

    #[must_use]
    pub fn format(&self) -> RecordFormat {
        self.format
    }

    /// Read `out.len() / record_size` consecutive records starting at `first`.
    ///
    /// `out` must hold a whole number of records.
    pub fn read_records(&mut self, first: u64, out: &mut [u8]) -> DecodeResult<()> {
        let record_size = self.format.record_size();
        if out.len() % record_size != 0 {
            return Err(DecodeError::InvalidFormat {
                context: "record read",
                detail: format!(
                    "buffer of {} bytes is not a multiple of the {record_size}-byte record size",
                    out.len()
                ),
            });
        }

        let offset = first * record_size_u64(self.format);
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(|e| DecodeError::io("seek point file", e))?;
        read_fully(&mut self.file, out)
    }

    /// Read the single record at `index` into `out`.
    pub fn read_record(&mut self, index: u64, out: &mut [u8]) -> DecodeResult<()> {
        let record_size = self.format.record_size();
        if out.len() != record_size {
            return Err(DecodeError::BufferTooSmall {
                expected: record_size,
                actual: out.len(),
            });
        }
        self.read_records(index, out)
    }
}

fn record_size_u64(format: RecordFormat) -> u64 {
    format.record_size() as u64
}

/// `read_exact`, reporting a short read as `BufferTooSmall` with the byte
/// count actually obtained.
fn read_fully(file: &mut File, out: &mut [u8]) -> DecodeResult<()> {
    let mut filled = 0;
    while filled < out.len() {
        match file.read(&mut out[filled..]) {
            Ok(0) => {
                return Err(DecodeError::BufferTooSmall {
                    expected: out.len(),
                    actual: filled,
                });
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(DecodeError::io("read point file", e)),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Precision;
    use std::io::Write;

    fn write_records(format: RecordFormat, count: usize) -> tempfile::NamedTempFile {
        let mut bytes = Vec::new();
        for i in 0..count {
            let v = i as f64;
            format.pack(&[v, v, v, v, v, v, v], &mut bytes);
        }
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&bytes).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_record_count() {
        let format = RecordFormat::new(Precision::Double);
        let file = write_records(format, 12);
        assert_eq!(RecordFile::count_records(file.path(), format).unwrap(), 12);
    }

    #[test]
    fn test_record_count_ignores_trailing_bytes() {
        let format = RecordFormat::new(Precision::Single);
        let mut file = write_records(format, 3);
        file.write_all(&[0u8; 5]).unwrap();
        file.flush().unwrap();
        assert_eq!(RecordFile::count_records(file.path(), format).unwrap(), 3);
    }

    #[test]
    fn test_read_records_contiguous() {
        let format = RecordFormat::new(Precision::Single);
        let file = write_records(format, 10);
        let mut records = RecordFile::open(file.path(), format).unwrap();

        let mut out = vec![0u8; format.record_size() * 3];
        records.read_records(4, &mut out).unwrap();

        let first = format.unpack(&out[..28]);
        let last = format.unpack(&out[56..]);
        assert_eq!(first[0], 4.0);
        assert_eq!(last[6], 6.0);
    }

    #[test]
    fn test_read_record_positioned() {
        let format = RecordFormat::new(Precision::Double);
        let file = write_records(format, 10);
        let mut records = RecordFile::open(file.path(), format).unwrap();

        let mut out = vec![0u8; format.record_size()];
        records.read_record(9, &mut out).unwrap();
        assert_eq!(format.unpack(&out)[2], 9.0);
        records.read_record(2, &mut out).unwrap();
        assert_eq!(format.unpack(&out)[2], 2.0);
    }

    #[test]
    fn test_read_past_end() {
        let format = RecordFormat::new(Precision::Double);
        let file = write_records(format, 2);
        let mut records = RecordFile::open(file.path(), format).unwrap();

        let mut out = vec![0u8; format.record_size() * 2];
        let result = records.read_records(1, &mut out);
        assert!(matches!(
            result,
            Err(DecodeError::BufferTooSmall {
                expected: 112,
                actual: 56
            })
        ));
    }

    #[test]
    fn test_open_missing() {
        let dir = tempfile::tempdir().unwrap();
        let result = RecordFile::open(dir.path().join("missing.xyzb"), RecordFormat::default());
        assert!(result.unwrap_err().is_not_found());
    }
}
