//! Level-of-detail hierarchy construction.
//!
//! A source file is cut into equal percentage batches. Every batch gets one
//! child per level of detail, and every child is nothing more than a batch
//! filename plus the viewer distance range it is shown at:
//!
//! ```text
//! scan.xyzb
//! ├── batch 0..1%   ─ scan.0-1-1.xyzb   [0, 5)
//! │                 ─ scan.0-1-20.xyzb  [5, 100)
//! ├── batch 1..2%   ─ scan.1-1-1.xyzb   [0, 5)
//! │                 ─ scan.1-1-20.xyzb  [5, 100)
//! ...
//! ```
//!
//! The pager requests those names lazily through [`BinaryPointsLoader`]. The
//! only data the builder reads itself is a size-only bounds lookup of the
//! first level of every batch, which places the batch for culling and primes
//! the bounds cache.

use std::{path::Path, str::FromStr};

use pointbatch_decode::{Bounds, Decimation, PERCENT_SCALE};

use crate::cache::BoundsCache;
use crate::error::{Error, Result};
use crate::loader::BinaryPointsLoader;
use crate::name::{self, BatchName};
use crate::options::LoadOptions;
use crate::resolve::PathResolver;
use crate::types::{Batch, ExpiryPolicy, LodChild, LodHierarchy, LodLevel};

/// Batching parameters for one dataset.
///
/// Parsed from `"<pointsPerBatch> <distMin>:<distMax>:<decimation> ..."`,
/// e.g. `"10000 100:1000000:20 20:100:10 6:20:5 0:5:5"`.
#[derive(Debug, Clone, PartialEq)]
pub struct LodConfig {
    /// Points per batch at the finest level of detail.
    pub points_per_batch: u64,
    pub levels: Vec<LodLevel>,
}

impl FromStr for LodConfig {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |detail: String| Error::InvalidData {
            context: "lod config",
            detail,
        };

        let mut tokens = s.split_whitespace();
        let points_per_batch = tokens
            .next()
            .ok_or_else(|| invalid("missing points per batch".to_string()))?;
        let points_per_batch = points_per_batch
            .parse()
            .map_err(|e| invalid(format!("invalid points per batch '{points_per_batch}': {e}")))?;

        let levels = tokens
            .map(|token| {
                let fields: Vec<&str> = token.split(':').collect();
                let [dist_min, dist_max, decimation] = fields.as_slice() else {
                    return Err(invalid(format!(
                        "expected distMin:distMax:decimation, got '{token}'"
                    )));
                };
                let distance = |field: &str| {
                    field
                        .parse::<f32>()
                        .map_err(|e| invalid(format!("invalid distance in '{token}': {e}")))
                };
                let decimation = decimation
                    .parse::<i64>()
                    .map_err(|e| invalid(format!("invalid decimation in '{token}': {e}")))?;

                Ok(LodLevel::new(
                    distance(*dist_min)?,
                    distance(*dist_max)?,
                    Decimation::new(decimation),
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        if levels.is_empty() {
            return Err(invalid("no levels of detail".to_string()));
        }

        Ok(Self {
            points_per_batch,
            levels,
        })
    }
}

/// Builds the batch hierarchy of a point file.
#[derive(Debug, Clone)]
pub struct LodTreeBuilder {
    config: LodConfig,
    options: LoadOptions,
    expiry: ExpiryPolicy,
}

impl LodTreeBuilder {
    #[must_use]
    pub fn new(points_per_batch: u64, levels: Vec<LodLevel>) -> Self {
        Self::from_config(LodConfig {
            points_per_batch,
            levels,
        })
    }

    #[must_use]
    pub fn from_config(config: LodConfig) -> Self {
        Self {
            config,
            options: LoadOptions::default(),
            expiry: ExpiryPolicy::default(),
        }
    }

    /// Options for the record count and bounds lookups: record precision and
    /// sampling.
    #[must_use]
    pub fn with_options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_expiry(mut self, expiry: ExpiryPolicy) -> Self {
        self.expiry = expiry;
        self
    }

    /// Smallest decimation across all levels: the finest density any batch
    /// is ever loaded at, which bounds the geometry allocated per batch.
    #[must_use]
    pub fn min_decimation(&self) -> Decimation {
        self.config
            .levels
            .iter()
            .map(|level| level.decimation)
            .min()
            .unwrap_or_default()
    }

    /// Build the hierarchy of the file `file` resolves to.
    ///
    /// `file` must be a plain `base.ext` name.
    pub fn build<R, C>(
        &self,
        loader: &mut BinaryPointsLoader<R, C>,
        file: &str,
    ) -> Result<LodHierarchy>
    where
        R: PathResolver,
        C: BoundsCache,
    {
        let Some(first_level) = self.config.levels.first() else {
            return Err(Error::InvalidData {
                context: "lod config",
                detail: "no levels of detail".to_string(),
            });
        };

        let source = BatchName::parse(file)?;
        if source.batched {
            return Err(Error::InvalidData {
                context: "lod source",
                detail: format!("{file} is already a batch name"),
            });
        }
        let base = source.file.with_extension("").to_string_lossy().into_owned();
        let ext = source
            .file
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();

        let total_records = loader.record_count(&source.file, &self.options)?;
        if total_records == 0 {
            return Err(Error::InvalidData {
                context: "lod source",
                detail: format!("{file} holds no records"),
            });
        }

        let (length_percent, points_per_batch) =
            batch_length_percent(total_records, self.config.points_per_batch);

        tracing::info!(
            file,
            total_records,
            points_per_batch,
            length_percent,
            levels = self.config.levels.len(),
            "building lod hierarchy"
        );

        let lookup_options = self.options.clone().with_size_only(true);
        let mut bounds = Bounds::new();
        let mut batches = Vec::new();

        let scale = u32::try_from(PERCENT_SCALE).unwrap_or(100);
        let mut start_percent = 0;
        while start_percent < scale {
            let children: Vec<LodChild> = self
                .config
                .levels
                .iter()
                .map(|level| LodChild {
                    filename: name::encode(
                        &base,
                        start_percent,
                        length_percent,
                        level.decimation,
                        &ext,
                    ),
                    dist_min: level.dist_min,
                    dist_max: level.dist_max,
                    decimation: level.decimation,
                    expiry: self.expiry,
                })
                .collect();

            let lookup = name::encode(
                &base,
                start_percent,
                length_percent,
                first_level.decimation,
                &ext,
            );
            let batch_bounds = match loader.read_bounds(&lookup, &lookup_options) {
                Ok(b) if !b.is_empty() => Some(b),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!(batch = %lookup, "bounds lookup failed: {e}");
                    None
                }
            };
            if let Some(b) = &batch_bounds {
                bounds.merge(b);
            }

            batches.push(Batch {
                start_percent,
                length_percent: length_percent.min(scale - start_percent),
                center: batch_bounds.as_ref().map(Bounds::center),
                bounds: batch_bounds,
                children,
            });
            start_percent += length_percent;
        }

        Ok(LodHierarchy {
            source: Path::new(file).to_path_buf(),
            total_records,
            points_per_batch,
            length_percent,
            min_decimation: self.min_decimation(),
            batches,
            bounds,
        })
    }
}

/// Batch length in percent of `total_records` for a requested point count.
///
/// The length is `points_per_batch * 100 / total_records`, independent of the
/// levels' decimation. Lengths below 1% are clamped to 1%, which caps a file
/// at 100 batches; the returned point count is then `total_records / 100`.
#[must_use]
pub fn batch_length_percent(total_records: u64, points_per_batch: u64) -> (u32, u64) {
    if total_records == 0 {
        return (u32::try_from(PERCENT_SCALE).unwrap_or(100), points_per_batch);
    }

    let percent = points_per_batch.saturating_mul(PERCENT_SCALE) / total_records;

    if percent < 1 {
        let adjusted = total_records / PERCENT_SCALE;
        tracing::info!(
            requested = points_per_batch,
            adjusted,
            "points per batch too small, using 1% batches"
        );
        return (1, adjusted);
    }

    let percent = u32::try_from(percent.min(PERCENT_SCALE)).unwrap_or(100);
    (percent, points_per_batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryBoundsCache, NoBoundsCache};
    use crate::resolve::SearchPathResolver;
    use glam::Vec3;
    use pointbatch_decode::{Precision, RecordFormat, Sampling};
    use std::fs;

    /// Record `i` sits at `(i, 0, 0)` with red channel `i / count`.
    fn write_line(dir: &Path, name: &str, count: usize) {
        let format = RecordFormat::new(Precision::Double);
        let mut bytes = Vec::new();
        for i in 0..count {
            let v = i as f64;
            format.pack(&[v, 0.0, 0.0, v / count as f64, 0.0, 0.0, 1.0], &mut bytes);
        }
        fs::write(dir.join(name), bytes).unwrap();
    }

    fn levels() -> Vec<LodLevel> {
        vec![
            LodLevel::new(0.0, 5.0, Decimation::new(2)),
            LodLevel::new(5.0, 100.0, Decimation::new(20)),
        ]
    }

    #[test]
    fn test_parse_config() {
        let config: LodConfig = "10000 100:1000000:20 20:100:10 0:5:1".parse().unwrap();
        assert_eq!(config.points_per_batch, 10000);
        assert_eq!(config.levels.len(), 3);
        assert_eq!(
            config.levels[0],
            LodLevel::new(100.0, 1_000_000.0, Decimation::new(20))
        );
        assert_eq!(config.levels[2].decimation, Decimation::NONE);
    }

    #[test]
    fn test_parse_config_errors() {
        for bad in ["", "many 0:5:1", "100", "100 0:5", "100 0:five:1", "100 0:5:x"] {
            assert!(
                matches!(bad.parse::<LodConfig>(), Err(Error::InvalidData { .. })),
                "'{bad}' should be rejected"
            );
        }
    }

    #[test]
    fn test_batch_length_percent() {
        assert_eq!(batch_length_percent(1_000_000, 10_000), (1, 10_000));
        assert_eq!(batch_length_percent(1_000_000, 50_000), (5, 50_000));
        assert_eq!(batch_length_percent(1_000_000, 2_000_000), (100, 2_000_000));
    }

    #[test]
    fn test_batch_length_percent_clamps() {
        assert_eq!(batch_length_percent(1_000_000, 10), (1, 10_000));
    }

    #[test]
    fn test_min_decimation() {
        let builder = LodTreeBuilder::new(100, levels());
        assert_eq!(builder.min_decimation(), Decimation::new(2));
    }

    #[test]
    fn test_build_ignores_level_decimation_for_length() {
        let dir = tempfile::tempdir().unwrap();
        write_line(dir.path(), "line.xyzb", 10_000);
        let mut loader =
            BinaryPointsLoader::new(SearchPathResolver::new().with_root(dir.path()), NoBoundsCache);

        let coarse = vec![
            LodLevel::new(0.0, 5.0, Decimation::new(5)),
            LodLevel::new(5.0, 100.0, Decimation::new(20)),
        ];
        let hierarchy = LodTreeBuilder::new(100, coarse)
            .build(&mut loader, "line.xyzb")
            .unwrap();

        assert_eq!(hierarchy.length_percent, 1);
        assert_eq!(hierarchy.min_decimation, Decimation::new(5));
        assert_eq!(hierarchy.batches.len(), 100);
        assert_eq!(hierarchy.batches[99].children[0].filename, "line.99-1-5.xyzb");
        assert_eq!(hierarchy.batches[99].children[1].filename, "line.99-1-20.xyzb");
    }

    #[test]
    fn test_build_uneven_batches() {
        let dir = tempfile::tempdir().unwrap();
        write_line(dir.path(), "line.xyzb", 1000);
        let mut loader =
            BinaryPointsLoader::new(SearchPathResolver::new().with_root(dir.path()), NoBoundsCache);

        let builder = LodTreeBuilder::new(300, levels())
            .with_options(LoadOptions::default().with_sampling(Sampling::Sequential));
        let hierarchy = builder.build(&mut loader, "line.xyzb").unwrap();

        assert_eq!(hierarchy.total_records, 1000);
        assert_eq!(hierarchy.length_percent, 30);
        let ranges: Vec<(u32, u32)> = hierarchy
            .batches
            .iter()
            .map(|b| (b.start_percent, b.length_percent))
            .collect();
        assert_eq!(ranges, vec![(0, 30), (30, 30), (60, 30), (90, 10)]);
        assert_eq!(hierarchy.child_count(), 8);

        // Every name carries the nominal length; the final one reads to the end.
        let last = &hierarchy.batches[3];
        assert_eq!(last.children[0].filename, "line.90-30-2.xyzb");
        assert_eq!(last.children[1].filename, "line.90-30-20.xyzb");
        assert_eq!(last.children[1].dist_min, 5.0);
        assert_eq!(last.children[1].expiry, ExpiryPolicy::default());
    }

    #[test]
    fn test_final_batch_reaches_last_record() {
        let dir = tempfile::tempdir().unwrap();
        write_line(dir.path(), "line.xyzb", 1003);
        let mut loader =
            BinaryPointsLoader::new(SearchPathResolver::new().with_root(dir.path()), NoBoundsCache);

        let levels = vec![LodLevel::new(0.0, 10.0, Decimation::NONE)];
        let hierarchy = LodTreeBuilder::new(300, levels)
            .build(&mut loader, "line.xyzb")
            .unwrap();
        assert_eq!(hierarchy.length_percent, 29);

        let last = hierarchy.batches.last().unwrap();
        assert_eq!(last.children[0].filename, "line.87-29-1.xyzb");
        assert_eq!(last.bounds.unwrap().position_max.x, 1002.0);

        let batch = loader
            .read_points(&last.children[0].filename, &LoadOptions::default())
            .unwrap();
        assert_eq!(batch.window.end(), 1003);
        assert_eq!(batch.positions.last().unwrap().x, 1002.0);
    }

    #[test]
    fn test_build_sets_centers_and_color_bounds() {
        let dir = tempfile::tempdir().unwrap();
        write_line(dir.path(), "line.xyzb", 1000);
        let cache = MemoryBoundsCache::new();
        let mut loader = BinaryPointsLoader::new(
            SearchPathResolver::new().with_root(dir.path()),
            cache.clone(),
        );

        let builder = LodTreeBuilder::new(250, vec![LodLevel::new(0.0, 10.0, Decimation::NONE)])
            .with_options(LoadOptions::default().with_sampling(Sampling::Sequential));
        let hierarchy = builder.build(&mut loader, "line.xyzb").unwrap();

        assert_eq!(hierarchy.batches.len(), 4);
        assert_eq!(hierarchy.batches[0].center, Some(Vec3::new(124.5, 0.0, 0.0)));
        assert_eq!(hierarchy.batches[3].center, Some(Vec3::new(874.5, 0.0, 0.0)));
        assert_eq!(hierarchy.bounds.color_min.x, 0.0);
        assert!((hierarchy.bounds.color_max.x - 0.999).abs() < 1e-6);
        assert_eq!(cache.len(), 4);
    }

    #[test]
    fn test_build_rejects_bad_input() {
        let dir = tempfile::tempdir().unwrap();
        write_line(dir.path(), "line.xyzb", 10);
        fs::write(dir.path().join("empty.xyzb"), b"").unwrap();
        let mut loader =
            BinaryPointsLoader::new(SearchPathResolver::new().with_root(dir.path()), NoBoundsCache);

        assert!(matches!(
            LodTreeBuilder::new(10, Vec::new()).build(&mut loader, "line.xyzb"),
            Err(Error::InvalidData { .. })
        ));
        assert!(matches!(
            LodTreeBuilder::new(10, levels()).build(&mut loader, "line.0-1-1.xyzb"),
            Err(Error::InvalidData { .. })
        ));
        assert!(matches!(
            LodTreeBuilder::new(10, levels()).build(&mut loader, "empty.xyzb"),
            Err(Error::InvalidData { .. })
        ));
        assert!(matches!(
            LodTreeBuilder::new(10, levels()).build(&mut loader, "absent.xyzb"),
            Err(Error::NotFound { .. })
        ));
    }
}
