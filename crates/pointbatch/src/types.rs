//! Level-of-detail hierarchy types.
//!
//! These describe the output of [`LodTreeBuilder`](crate::LodTreeBuilder):
//! a flat list of batches, each listing the synthesized filename to page in
//! for every distance range.

use std::path::PathBuf;

use glam::Vec3;
use pointbatch_decode::{Bounds, Decimation};

/// One level of detail: the decimation to use between two viewer distances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LodLevel {
    /// Nearest viewer distance this level is shown at.
    pub dist_min: f32,
    /// Farthest viewer distance this level is shown at.
    pub dist_max: f32,
    pub decimation: Decimation,
}

impl LodLevel {
    #[must_use]
    pub fn new(dist_min: f32, dist_max: f32, decimation: Decimation) -> Self {
        Self {
            dist_min,
            dist_max,
            decimation,
        }
    }

    /// Whether a viewer at `distance` should see this level.
    #[must_use]
    pub fn contains(&self, distance: f32) -> bool {
        distance >= self.dist_min && distance < self.dist_max
    }
}

/// How long the pager must keep a loaded child before it may expire it.
///
/// A child is only eligible for expiry once both minimums have passed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpiryPolicy {
    /// Minimum number of frames a loaded child stays resident.
    pub min_frames: u32,
    /// Minimum time, in seconds, a loaded child stays resident.
    pub min_time: f64,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self {
            min_frames: 60,
            min_time: 5.0,
        }
    }
}

/// A pageable reference to one level of detail of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct LodChild {
    /// The batch filename to request, e.g. `scan.12-3-20.xyzb`.
    pub filename: String,
    pub dist_min: f32,
    pub dist_max: f32,
    pub decimation: Decimation,
    pub expiry: ExpiryPolicy,
}

/// One percentage partition of the source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub start_percent: u32,
    /// Effective length in percent, `100 - start_percent` for a final batch
    /// that overruns. Child names always carry the nominal length, which the
    /// decoder clamps to the end of the file.
    pub length_percent: u32,
    /// Midpoint of the batch's position bounds, used for visibility culling.
    ///
    /// `None` if the bounds lookup returned nothing.
    pub center: Option<Vec3>,
    /// Bounds reported by the lookup of the first level of detail.
    pub bounds: Option<Bounds>,
    /// One child per level of detail, in level order.
    pub children: Vec<LodChild>,
}

/// The batches of one source file.
#[derive(Debug, Clone)]
pub struct LodHierarchy {
    /// Logical name of the source file.
    pub source: PathBuf,
    /// Record count of the source file.
    pub total_records: u64,
    /// Points per batch at the finest level, after any adjustment.
    pub points_per_batch: u64,
    /// Nominal batch length in percent, encoded in every child name.
    pub length_percent: u32,
    /// Smallest decimation across the levels. Sizes the geometry allocated
    /// per batch.
    pub min_decimation: Decimation,
    pub batches: Vec<Batch>,
    /// Union of all looked-up batch bounds. The color extents are used to
    /// normalize color mapping across the whole dataset.
    pub bounds: Bounds,
}

impl LodHierarchy {
    /// Total number of child references across all batches.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.batches.iter().map(|b| b.children.len()).sum()
    }
}
