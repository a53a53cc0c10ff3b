//! Batch filename encoding.
//!
//! A batch is requested by a synthesized filename that carries its load
//! parameters:
//!
//! ```text
//! {base}.{startPercent}-{lengthPercent}-{decimation}.{ext}
//! ```
//!
//! A paging loader that is only ever handed a name can recover the source file
//! and the range to decode from it. Names with just two dot-separated segments
//! (`{base}.{ext}`) refer to a whole file with default parameters.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use pointbatch_decode::Decimation;

use crate::error::{Error, Result};

/// Build the filename of one batch.
#[must_use]
pub fn encode(
    base: &str,
    start_percent: u32,
    length_percent: u32,
    decimation: Decimation,
    ext: &str,
) -> String {
    format!("{base}.{start_percent}-{length_percent}-{decimation}.{ext}")
}

/// Load parameters recovered from a batch filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchName {
    /// The file holding the records, e.g. `scans/data.xyzb`.
    pub file: PathBuf,
    pub start_percent: u32,
    pub length_percent: u32,
    pub decimation: Decimation,
    /// Whether the name carried batch parameters. Plain names leave the
    /// parameters to the caller's configuration.
    pub batched: bool,
}

impl BatchName {
    /// A plain, unbatched reference to a whole file.
    #[must_use]
    pub fn plain(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            start_percent: 0,
            length_percent: 0,
            decimation: Decimation::NONE,
            batched: false,
        }
    }

    /// Decode a batch filename.
    ///
    /// Only the final path component is inspected; any directory is carried
    /// over to [`file`](Self::file).
    pub fn parse(name: &str) -> Result<Self> {
        let malformed = |detail: String| Error::MalformedName {
            name: name.to_string(),
            detail,
        };

        let path = Path::new(name);
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| malformed("no file name".to_string()))?;

        let segments: Vec<&str> = file_name.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(malformed("empty name segment".to_string()));
        }

        match segments.as_slice() {
            [_, _] => Ok(Self::plain(path)),
            [base, params, ext] => {
                let fields: Vec<&str> = params.split('-').collect();
                let [start, length, decimation] = fields.as_slice() else {
                    return Err(malformed(format!(
                        "expected start-length-decimation, got '{params}'"
                    )));
                };
                let parse = |field: &str, what: &str| {
                    field
                        .parse::<u32>()
                        .map_err(|e| malformed(format!("invalid {what} '{field}': {e}")))
                };

                let file_name = format!("{base}.{ext}");
                let file = match path.parent() {
                    Some(parent) => parent.join(file_name),
                    None => PathBuf::from(file_name),
                };

                Ok(Self {
                    file,
                    start_percent: parse(*start, "start")?,
                    length_percent: parse(*length, "length")?,
                    decimation: Decimation::new(i64::from(parse(*decimation, "decimation")?)),
                    batched: true,
                })
            }
            _ => Err(malformed(format!(
                "expected 2 or 3 dot-separated segments, got {}",
                segments.len()
            ))),
        }
    }
}

impl fmt::Display for BatchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.batched {
            return write!(f, "{}", self.file.display());
        }

        let stem = self.file.with_extension("");
        let ext = self
            .file
            .extension()
            .map(|e| e.to_string_lossy())
            .unwrap_or_default();
        write!(
            f,
            "{}",
            encode(
                &stem.to_string_lossy(),
                self.start_percent,
                self.length_percent,
                self.decimation,
                &ext,
            )
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode() {
        assert_eq!(
            encode("data", 12, 3, Decimation::new(20), "xyzb"),
            "data.12-3-20.xyzb"
        );
    }

    #[test]
    fn test_parse_batched() {
        let name = BatchName::parse("data.12-3-20.xyzb").unwrap();
        assert_eq!(name.file, PathBuf::from("data.xyzb"));
        assert_eq!(name.start_percent, 12);
        assert_eq!(name.length_percent, 3);
        assert_eq!(name.decimation.get(), 20);
        assert!(name.batched);
    }

    #[test]
    fn test_parse_keeps_directory() {
        let name = BatchName::parse("scans/site.a/data.0-1-5.xyzb").unwrap();
        assert_eq!(name.file, PathBuf::from("scans/site.a/data.xyzb"));
        assert_eq!(name.to_string(), "scans/site.a/data.0-1-5.xyzb");
    }

    #[test]
    fn test_parse_plain() {
        let name = BatchName::parse("data.xyzb").unwrap();
        assert_eq!(name, BatchName::plain("data.xyzb"));
        assert_eq!(name.to_string(), "data.xyzb");
    }

    #[test]
    fn test_parse_zero_decimation_normalizes() {
        let name = BatchName::parse("data.0-0-0.xyzb").unwrap();
        assert_eq!(name.decimation, Decimation::NONE);
    }

    #[test]
    fn test_parse_malformed() {
        for bad in [
            "data",
            "data.1-2.xyzb",
            "data.1-2-3-4.xyzb",
            "data.a-2-3.xyzb",
            "data.1-2-3.extra.xyzb",
            "data..xyzb",
            "data.1--3.xyzb",
        ] {
            assert!(
                matches!(BatchName::parse(bad), Err(Error::MalformedName { .. })),
                "{bad} should be malformed"
            );
        }
    }

    proptest! {
        #[test]
        fn prop_encode_parse_roundtrip(
            base in "[a-zA-Z_][a-zA-Z0-9_]{0,12}",
            ext in "[a-z]{1,5}",
            start in 0u32..=100,
            length in 0u32..=100,
            decimation in 1u32..10_000,
        ) {
            let encoded = encode(&base, start, length, Decimation::from(decimation), &ext);
            let name = BatchName::parse(&encoded).unwrap();
            prop_assert_eq!(name.start_percent, start);
            prop_assert_eq!(name.length_percent, length);
            prop_assert_eq!(name.decimation.get(), decimation);
            prop_assert_eq!(&name.file, &PathBuf::from(format!("{base}.{ext}")));
            prop_assert_eq!(name.to_string(), encoded);
        }
    }
}
