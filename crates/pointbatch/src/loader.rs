//! Name-driven batch loading.
//!
//! The loader is what a paging consumer calls with a batch filename. It
//! decodes the name, resolves the source file, and either decodes the points
//! or answers a size-only request from the bounds cache.

use std::path::{Path, PathBuf};

use pointbatch_decode::{BatchRequest, Bounds, PointBatch, PointBatchDecoder, PointSource};
use rand::{SeedableRng, rngs::StdRng};

use crate::cache::BoundsCache;
use crate::error::{Error, Result};
use crate::name::BatchName;
use crate::options::LoadOptions;
use crate::resolve::PathResolver;
use crate::sink::{GeometrySink, LoadSummary, draw_ranges};

/// File extension handled by the binary loader.
pub const BINARY_EXTENSION: &str = "xyzb";

/// Result of a load request.
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    /// The name was malformed or its file could not be found or read.
    NotHandled,
    /// Decoded points.
    Points(PointBatch),
    /// Bounds of a size-only request.
    Bounds(Bounds),
}

/// A fully located request.
#[derive(Debug)]
struct Located {
    /// Physical path of the record file.
    physical: PathBuf,
    /// The batch name placed in the record file's directory.
    cache_key: PathBuf,
    request: BatchRequest,
}

/// Loads batches of binary point files by name.
pub struct BinaryPointsLoader<R, C> {
    resolver: R,
    cache: C,
    source: Box<dyn PointSource>,
    rng: StdRng,
}

impl<R: PathResolver, C: BoundsCache> BinaryPointsLoader<R, C> {
    /// Create a loader whose random decimation is seeded from the OS.
    #[must_use]
    pub fn new(resolver: R, cache: C) -> Self {
        Self {
            resolver,
            cache,
            source: Box::new(PointBatchDecoder::new()),
            rng: StdRng::from_os_rng(),
        }
    }

    /// Seed the random decimation source, making loads reproducible.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Replace the point decoder.
    #[must_use]
    pub fn with_source(mut self, source: impl PointSource + 'static) -> Self {
        self.source = Box::new(source);
        self
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Whether this loader handles files with the given extension.
    #[must_use]
    pub fn supports_extension(ext: &str) -> bool {
        ext.eq_ignore_ascii_case(BINARY_EXTENSION)
    }

    /// Load a batch, degrading every failure to [`LoadOutcome::NotHandled`].
    ///
    /// Failures are logged: malformed names and missing files as warnings,
    /// everything else (allocation failures, unreadable files) as errors.
    pub fn read(&mut self, name: &str, options: &LoadOptions) -> LoadOutcome {
        match self.try_read(name, options) {
            Ok(outcome) => outcome,
            Err(e) => {
                if e.is_not_handled() {
                    tracing::warn!(name, "{e}");
                } else {
                    tracing::error!(name, "{e}");
                }
                LoadOutcome::NotHandled
            }
        }
    }

    /// Load a batch: its bounds if `options.size_only`, otherwise its points.
    pub fn try_read(&mut self, name: &str, options: &LoadOptions) -> Result<LoadOutcome> {
        if options.size_only {
            self.read_bounds(name, options).map(LoadOutcome::Bounds)
        } else {
            self.read_points(name, options).map(LoadOutcome::Points)
        }
    }

    /// Decode the points of a batch.
    pub fn read_points(&mut self, name: &str, options: &LoadOptions) -> Result<PointBatch> {
        let located = self.locate(name, options)?;
        let batch = self
            .source
            .decode(&located.physical, &located.request, &mut self.rng)?;

        tracing::debug!(name, points = batch.len(), "decoded batch");
        Ok(batch)
    }

    /// Bounds of a batch, from the cache if present.
    ///
    /// On a miss the batch is decoded and the result written back. A failed
    /// write is logged and does not fail the request.
    ///
    /// Entries are keyed by name alone. A plain `base.ext` name therefore
    /// shares one entry across every `start`/`length`/`decimation` option;
    /// use a batch name to cache a specific range.
    pub fn read_bounds(&mut self, name: &str, options: &LoadOptions) -> Result<Bounds> {
        let located = self.locate(name, options)?;

        if let Some(bounds) = self.cache.get(&located.cache_key)? {
            tracing::debug!(name, "bounds cache hit");
            return Ok(bounds);
        }

        let batch = self
            .source
            .decode(&located.physical, &located.request, &mut self.rng)?;
        if let Err(e) = self.cache.put(&located.cache_key, &batch.bounds) {
            tracing::warn!(name, "{e}");
        }

        tracing::debug!(name, points = batch.len(), "computed batch bounds");
        Ok(batch.bounds)
    }

    /// Load a batch and hand its points to `sink`.
    ///
    /// Size-only requests report their bounds without touching the sink.
    /// Returns `None` if the request was not handled.
    pub fn load_into(
        &mut self,
        name: &str,
        options: &LoadOptions,
        sink: &mut dyn GeometrySink,
    ) -> Option<LoadSummary> {
        match self.read(name, options) {
            LoadOutcome::NotHandled => None,
            LoadOutcome::Bounds(bounds) => Some(LoadSummary {
                num_points: 0,
                bounds,
            }),
            LoadOutcome::Points(batch) => {
                let summary = LoadSummary::from_batch(&batch);
                let ranges = draw_ranges(batch.len(), options.batch_size);
                tracing::debug!(
                    name,
                    ranges = ranges.len(),
                    batch_size = options.batch_size,
                    "creating draw ranges"
                );
                sink.adopt(batch, ranges);
                Some(summary)
            }
        }
    }

    /// Record count of the file behind a logical name.
    pub fn record_count(&self, name: &Path, options: &LoadOptions) -> Result<u64> {
        let physical = self.resolve(name)?;
        Ok(pointbatch_decode::RecordFile::count_records(
            physical,
            options.record_format(),
        )?)
    }

    fn resolve(&self, name: &Path) -> Result<PathBuf> {
        self.resolver.resolve(name).ok_or_else(|| Error::NotFound {
            name: name.display().to_string(),
        })
    }

    fn locate(&self, name: &str, options: &LoadOptions) -> Result<Located> {
        let batch_name = BatchName::parse(name)?;
        let physical = self.resolve(&batch_name.file)?;

        let logical_file_name = Path::new(name)
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_default();
        let cache_key = physical
            .parent()
            .map_or_else(|| logical_file_name.clone(), |dir| dir.join(&logical_file_name));

        let (start_percent, length_percent, decimation) = if batch_name.batched {
            (
                batch_name.start_percent,
                batch_name.length_percent,
                batch_name.decimation,
            )
        } else {
            (
                options.start_percent,
                options.length_percent,
                options.decimation,
            )
        };

        Ok(Located {
            physical,
            cache_key,
            request: BatchRequest {
                start_percent,
                length_percent,
                decimation,
                sampling: options.sampling,
                format: options.record_format(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{FilesystemBoundsCache, MemoryBoundsCache, NoBoundsCache};
    use crate::resolve::SearchPathResolver;
    use glam::Vec3;
    use pointbatch_decode::{Decimation, Precision, RecordFormat, Sampling};
    use std::{cell::Cell, fs, ops::Range, rc::Rc};

    fn write_points(dir: &Path, name: &str, count: usize) {
        let format = RecordFormat::new(Precision::Double);
        let mut bytes = Vec::new();
        for i in 0..count {
            let v = i as f64;
            format.pack(&[v, -v, 1.0, 0.5, 0.5, 0.5, 1.0], &mut bytes);
        }
        fs::write(dir.join(name), bytes).unwrap();
    }

    /// Show the loader's warnings and errors in test output.
    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    }

    fn sequential() -> LoadOptions {
        LoadOptions::default().with_sampling(Sampling::Sequential)
    }

    /// Counts decodes so tests can tell whether the record file was read.
    struct CountingSource(Rc<Cell<usize>>);

    impl PointSource for CountingSource {
        fn decode(
            &self,
            path: &Path,
            request: &BatchRequest,
            rng: &mut dyn rand::RngCore,
        ) -> pointbatch_decode::DecodeResult<PointBatch> {
            self.0.set(self.0.get() + 1);
            PointBatchDecoder::decode_file(path, request, rng)
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        adopted: Vec<(usize, Vec<Range<usize>>)>,
    }

    impl GeometrySink for RecordingSink {
        fn adopt(&mut self, batch: PointBatch, draw_ranges: Vec<Range<usize>>) {
            self.adopted.push((batch.len(), draw_ranges));
        }
    }

    #[test]
    fn test_read_batched_name() {
        let dir = tempfile::tempdir().unwrap();
        write_points(dir.path(), "scan.xyzb", 1000);
        let mut loader =
            BinaryPointsLoader::new(SearchPathResolver::new().with_root(dir.path()), NoBoundsCache);

        let LoadOutcome::Points(batch) = loader.read("scan.10-20-5.xyzb", &sequential()) else {
            panic!("expected points");
        };
        assert_eq!(batch.len(), 40);
        assert_eq!(batch.positions[0], Vec3::new(100.0, -100.0, 1.0));
        assert_eq!(batch.positions[39].x, 295.0);
    }

    #[test]
    fn test_read_plain_name_uses_options() {
        let dir = tempfile::tempdir().unwrap();
        write_points(dir.path(), "scan.xyzb", 100);
        let mut loader =
            BinaryPointsLoader::new(SearchPathResolver::new().with_root(dir.path()), NoBoundsCache);

        let options = sequential()
            .with_range(50, 0)
            .with_decimation(Decimation::new(2));
        let LoadOutcome::Points(batch) = loader.read("scan.xyzb", &options) else {
            panic!("expected points");
        };
        assert_eq!(batch.len(), 25);
        assert_eq!(batch.positions[0].x, 50.0);
    }

    #[test]
    fn test_not_handled() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let mut loader =
            BinaryPointsLoader::new(SearchPathResolver::new().with_root(dir.path()), NoBoundsCache);

        assert!(matches!(
            loader.read("missing.xyzb", &sequential()),
            LoadOutcome::NotHandled
        ));
        assert!(matches!(
            loader.read("scan.1-2.xyzb", &sequential()),
            LoadOutcome::NotHandled
        ));
        assert!(matches!(
            loader.try_read("scan.1-x-2.xyzb", &sequential()),
            Err(Error::MalformedName { .. })
        ));
    }

    #[test]
    fn test_size_only_populates_cache() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        write_points(dir.path(), "scan.xyzb", 100);
        let decodes = Rc::new(Cell::new(0));
        let mut loader = BinaryPointsLoader::new(
            SearchPathResolver::new().with_root(dir.path()),
            FilesystemBoundsCache,
        )
        .with_source(CountingSource(Rc::clone(&decodes)));

        let options = sequential().with_size_only(true);
        let LoadOutcome::Bounds(first) = loader.read("scan.0-50-1.xyzb", &options) else {
            panic!("expected bounds");
        };
        assert_eq!(decodes.get(), 1);
        assert_eq!(first.position_max.x, 49.0);
        assert!(dir.path().join("bounds/scan.0-50-1.bounds").is_file());

        let LoadOutcome::Bounds(second) = loader.read("scan.0-50-1.xyzb", &options) else {
            panic!("expected bounds");
        };
        assert_eq!(decodes.get(), 1);
        assert_eq!(first, second);
    }

    #[test]
    fn test_cache_serves_stale_bounds() {
        let dir = tempfile::tempdir().unwrap();
        write_points(dir.path(), "scan.xyzb", 100);
        let cache = MemoryBoundsCache::new();
        let mut loader = BinaryPointsLoader::new(
            SearchPathResolver::new().with_root(dir.path()),
            cache.clone(),
        );
        let options = sequential().with_size_only(true);

        let before = loader.read_bounds("scan.xyzb", &options).unwrap();
        write_points(dir.path(), "scan.xyzb", 10);
        let after = loader.read_bounds("scan.xyzb", &options).unwrap();

        assert_eq!(before, after);
        assert_eq!(after.position_max.x, 99.0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_plain_name_bounds_ignore_range_options() {
        let dir = tempfile::tempdir().unwrap();
        write_points(dir.path(), "scan.xyzb", 100);
        let cache = MemoryBoundsCache::new();
        let mut loader = BinaryPointsLoader::new(
            SearchPathResolver::new().with_root(dir.path()),
            cache.clone(),
        );
        let options = sequential().with_size_only(true);

        let whole = loader.read_bounds("scan.xyzb", &options).unwrap();
        let upper = loader
            .read_bounds("scan.xyzb", &options.clone().with_range(50, 0))
            .unwrap();
        assert_eq!(whole, upper);
        assert_eq!(upper.position_min.x, 0.0);

        let batched = loader.read_bounds("scan.50-0-1.xyzb", &options).unwrap();
        assert_eq!(batched.position_min.x, 50.0);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_load_into_sink() {
        let dir = tempfile::tempdir().unwrap();
        write_points(dir.path(), "scan.xyzb", 2500);
        let mut loader =
            BinaryPointsLoader::new(SearchPathResolver::new().with_root(dir.path()), NoBoundsCache);
        let mut sink = RecordingSink::default();

        let summary = loader
            .load_into("scan.xyzb", &sequential(), &mut sink)
            .unwrap();
        assert_eq!(summary.num_points, 2500);
        assert_eq!(sink.adopted.len(), 1);
        assert_eq!(sink.adopted[0].0, 2500);
        assert_eq!(sink.adopted[0].1, vec![0..1000, 1000..2000, 2000..2500]);

        assert!(loader.load_into("nope.xyzb", &sequential(), &mut sink).is_none());
        assert_eq!(sink.adopted.len(), 1);
    }

    #[test]
    fn test_seeded_random_is_reproducible() {
        let dir = tempfile::tempdir().unwrap();
        write_points(dir.path(), "scan.xyzb", 1000);
        let load = |seed| {
            let mut loader = BinaryPointsLoader::new(
                SearchPathResolver::new().with_root(dir.path()),
                NoBoundsCache,
            )
            .with_seed(seed);
            loader
                .read_points("scan.0-100-10.xyzb", &LoadOptions::default())
                .unwrap()
                .positions
        };
        assert_eq!(load(7), load(7));
    }

    #[test]
    fn test_supports_extension() {
        assert!(BinaryPointsLoader::<SearchPathResolver, NoBoundsCache>::supports_extension("xyzb"));
        assert!(!BinaryPointsLoader::<SearchPathResolver, NoBoundsCache>::supports_extension("xyz"));
    }
}
