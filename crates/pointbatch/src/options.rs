//! Load configuration.

use pointbatch_decode::{Decimation, Precision, RecordFormat, Sampling};

use crate::error::{Error, Result};

/// Default number of points per draw range handed to the geometry assembler.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Options for one load request.
///
/// Batch filenames override `start_percent`, `length_percent` and
/// `decimation`; the remaining fields always come from here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Start of the range, in percent of the record count.
    pub start_percent: u32,
    /// Length of the range, in percent. 0 reads to the end.
    pub length_percent: u32,
    pub decimation: Decimation,
    pub sampling: Sampling,
    /// Points per draw range for the geometry assembler.
    pub batch_size: usize,
    /// Only compute (or fetch cached) bounds, without returning points.
    pub size_only: bool,
    /// Records are `f32` rather than `f64`.
    pub single_precision: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            start_percent: 0,
            length_percent: 0,
            decimation: Decimation::NONE,
            sampling: Sampling::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            size_only: false,
            single_precision: false,
        }
    }
}

impl LoadOptions {
    /// Build options from key/value pairs.
    ///
    /// Recognized keys: `format` (ignored), `start`, `length`, `decimation`,
    /// `batch-size`, `size-only`, `single-precision` and `sampling`
    /// (`random` or `sequential`). Flags accept an empty value as `true`.
    /// Unknown keys are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut options = Self::default();
        for (key, value) in pairs {
            options.set(key.as_ref(), value.as_ref())?;
        }
        Ok(options)
    }

    /// Apply one key/value pair.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = || Error::InvalidOption {
            key: key.to_string(),
            value: value.to_string(),
        };
        let value = value.trim();

        match key {
            "format" => {}
            "start" => self.start_percent = value.parse().map_err(|_| invalid())?,
            "length" => self.length_percent = value.parse().map_err(|_| invalid())?,
            "decimation" => {
                self.decimation = Decimation::new(value.parse().map_err(|_| invalid())?);
            }
            "batch-size" => {
                self.batch_size = value.parse().map_err(|_| invalid())?;
                if self.batch_size == 0 {
                    return Err(invalid());
                }
            }
            "size-only" => self.size_only = parse_flag(value).ok_or_else(invalid)?,
            "single-precision" => self.single_precision = parse_flag(value).ok_or_else(invalid)?,
            "sampling" => {
                self.sampling = match value {
                    "random" => Sampling::Random,
                    "sequential" => Sampling::Sequential,
                    _ => return Err(invalid()),
                };
            }
            _ => tracing::debug!(key, "ignoring unknown load option"),
        }
        Ok(())
    }

    #[must_use]
    pub fn with_range(mut self, start_percent: u32, length_percent: u32) -> Self {
        self.start_percent = start_percent;
        self.length_percent = length_percent;
        self
    }

    #[must_use]
    pub fn with_decimation(mut self, decimation: Decimation) -> Self {
        self.decimation = decimation;
        self
    }

    #[must_use]
    pub fn with_sampling(mut self, sampling: Sampling) -> Self {
        self.sampling = sampling;
        self
    }

    #[must_use]
    pub fn with_size_only(mut self, size_only: bool) -> Self {
        self.size_only = size_only;
        self
    }

    #[must_use]
    pub fn with_single_precision(mut self, single_precision: bool) -> Self {
        self.single_precision = single_precision;
        self
    }

    /// Record shape selected by `single_precision`.
    #[must_use]
    pub fn record_format(&self) -> RecordFormat {
        RecordFormat::new(Precision::from_single_flag(self.single_precision))
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value {
        "" | "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
