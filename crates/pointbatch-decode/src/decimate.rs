//! Record selection within a window.

use std::fmt;

use rand::{Rng, RngCore};

use crate::range::Window;

/// Decimation factor: one record is kept out of every bucket of this many.
///
/// Always at least 1; a factor of 1 keeps every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Decimation(u32);

impl Decimation {
    /// No decimation.
    pub const NONE: Self = Self(1);

    /// Create a decimation factor, normalizing values `<= 0` to 1.
    #[must_use]
    pub fn new(factor: i64) -> Self {
        if factor <= 0 {
            Self::NONE
        } else {
            Self(u32::try_from(factor).unwrap_or(u32::MAX))
        }
    }

    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }

    #[must_use]
    pub fn is_none(self) -> bool {
        self.0 == 1
    }
}

impl Default for Decimation {
    fn default() -> Self {
        Self::NONE
    }
}

impl From<u32> for Decimation {
    fn from(factor: u32) -> Self {
        Self::new(i64::from(factor))
    }
}

impl fmt::Display for Decimation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a record is chosen from each decimation bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sampling {
    /// The first record of every bucket.
    Sequential,
    /// One uniformly random record inside every bucket.
    ///
    /// Gives visually more uniform thinning than a fixed stride at high
    /// decimation factors.
    #[default]
    Random,
}

/// Selects the records of a window to materialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decimator {
    window: Window,
    decimation: Decimation,
    sampling: Sampling,
}

impl Decimator {
    #[must_use]
    pub fn new(window: Window, decimation: Decimation, sampling: Sampling) -> Self {
        Self {
            window,
            decimation,
            sampling,
        }
    }

    #[must_use]
    pub fn window(&self) -> Window {
        self.window
    }

    #[must_use]
    pub fn decimation(&self) -> Decimation {
        self.decimation
    }

    /// Number of indices produced: `window.length / decimation`.
    ///
    /// A trailing partial bucket is dropped.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.window.length / u64::from(self.decimation.get())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate the selected absolute record indices, in ascending order.
    ///
    /// `rng` is only drawn from for [`Sampling::Random`] with a factor above 1.
    /// Each call starts a fresh pass over the window.
    pub fn indices<'a>(&self, rng: &'a mut dyn RngCore) -> Indices<'a> {
        let step = u64::from(self.decimation.get());
        let jitter = match self.sampling {
            Sampling::Random if step > 1 => Some(rng),
            _ => None,
        };
        Indices {
            next_bucket: self.window.start,
            remaining: self.len(),
            step,
            jitter,
        }
    }
}

/// Iterator over decimated record indices. See [`Decimator::indices`].
pub struct Indices<'a> {
    next_bucket: u64,
    remaining: u64,
    step: u64,
    jitter: Option<&'a mut dyn RngCore>,
}

impl Iterator for Indices<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let bucket = self.next_bucket;
        self.next_bucket += self.step;

        let offset = match self.jitter.as_deref_mut() {
            Some(rng) => rng.random_range(0..self.step),
            None => 0,
        };
        Some(bucket + offset)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Indices<'_> {}
