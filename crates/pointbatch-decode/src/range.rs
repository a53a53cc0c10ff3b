//! Percentage-based record addressing.

/// Percent ranges are expressed in hundredths of the total record count.
pub const PERCENT_SCALE: u64 = 100;

/// An absolute range of records: `[start, start + length)`.
///
/// A window produced by [`Window::resolve`] always satisfies
/// `start + length <= total_records`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Window {
    /// Index of the first record.
    pub start: u64,
    /// Number of records.
    pub length: u64,
}

impl Window {
    #[must_use]
    pub fn new(start: u64, length: u64) -> Self {
        Self { start, length }
    }

    /// Resolve a percentage range against a file's record count.
    ///
    /// - `start = total * start_percent / 100`, floored.
    /// - `length = total * length_percent / 100`, floored.
    /// - A zero length, or one that would run past the end of the file, reads
    ///   to the end instead. A `length_percent` of 0 therefore means "all the
    ///   remaining records", never "nothing".
    ///
    /// An empty file yields an empty window. `start_percent` values above 100
    /// are clamped to 100.
    #[must_use]
    pub fn resolve(total_records: u64, start_percent: u32, length_percent: u32) -> Self {
        if total_records == 0 {
            return Self::default();
        }

        let start_percent = u64::from(start_percent).min(PERCENT_SCALE);
        let start = scale(total_records, start_percent);
        let mut length = scale(total_records, u64::from(length_percent));

        if length == 0 || start + length > total_records {
            length = total_records - start;
        }

        Self { start, length }
    }

    /// One past the last record in the window.
    #[must_use]
    pub fn end(&self) -> u64 {
        self.start + self.length
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    #[must_use]
    pub fn contains(&self, index: u64) -> bool {
        index >= self.start && index < self.end()
    }
}

/// `total * percent / 100` without intermediate overflow.
fn scale(total: u64, percent: u64) -> u64 {
    let scaled = u128::from(total) * u128::from(percent) / u128::from(PERCENT_SCALE);
    u64::try_from(scaled).unwrap_or(u64::MAX)
}
