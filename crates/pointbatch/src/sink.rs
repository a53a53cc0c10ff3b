//! Handing decoded batches to the host's geometry container.

use std::{fmt, ops::Range};

use pointbatch_decode::{Bounds, PointBatch};

/// Receives decoded batches.
///
/// Implemented by the host's scene container, which turns the buffers into
/// renderable geometry.
pub trait GeometrySink {
    /// Take ownership of a decoded batch.
    ///
    /// `draw_ranges` splits the points into contiguous groups of at most the
    /// configured batch size, one per drawable.
    fn adopt(&mut self, batch: PointBatch, draw_ranges: Vec<Range<usize>>);
}

/// Split `count` points into contiguous ranges of at most `batch_size`.
///
/// The final range holds the remainder.
#[must_use]
pub fn draw_ranges(count: usize, batch_size: usize) -> Vec<Range<usize>> {
    let batch_size = batch_size.max(1);
    (0..count)
        .step_by(batch_size)
        .map(|start| start..(start + batch_size).min(count))
        .collect()
}

/// What a load produced, as reported back to the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadSummary {
    pub num_points: usize,
    pub bounds: Bounds,
}

impl LoadSummary {
    #[must_use]
    pub fn from_batch(batch: &PointBatch) -> Self {
        Self {
            num_points: batch.len(),
            bounds: batch.bounds,
        }
    }
}

impl fmt::Display for LoadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (min, max) = (self.bounds.color_min, self.bounds.color_max);
        write!(
            f,
            "{{ 'numPoints': {}, 'minR': {}, 'maxR': {}, 'minG': {}, 'maxG': {}, \
             'minB': {}, 'maxB': {}, 'minA': {}, 'maxA': {} }}",
            self.num_points, min.x, max.x, min.y, max.y, min.z, max.z, min.w, max.w
        )
    }
}
