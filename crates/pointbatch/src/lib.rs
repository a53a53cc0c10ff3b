//! Percentage-addressed batch loading for binary point clouds.
//!
//! This crate sits between a host scene graph and the decoders in
//! [`pointbatch_decode`]. It turns filenames such as `scan.12-3-20.xyzb`
//! into decode requests, caches the bounds of every batch it decodes, and
//! cuts large files into paged level-of-detail hierarchies.
//!
//! # Design principles
//!
//! - **Stateless names**: A batch filename carries everything needed to load it
//! - **Pluggable seams**: Path lookup, bounds caching and geometry adoption are traits
//! - **Degrade, don't fail**: The host-facing entry point logs and reports "not handled"
//!
//! # Example
//!
//! ```ignore
//! use pointbatch::{BinaryPointsLoader, FilesystemBoundsCache, LoadOptions, SearchPathResolver};
//!
//! let resolver = SearchPathResolver::new().with_root("/data/scans");
//! let mut loader = BinaryPointsLoader::new(resolver, FilesystemBoundsCache);
//!
//! // Every 20th record of the 12%..15% range.
//! let batch = loader.read_points("site.12-3-20.xyzb", &LoadOptions::default())?;
//! ```

mod cache;
mod error;
mod loader;
mod lod;
mod name;
mod options;
mod resolve;
mod sink;
mod types;

pub use cache::{
    BOUNDS_DIR, BOUNDS_EXTENSION, BoundsCache, FilesystemBoundsCache, MemoryBoundsCache,
    NoBoundsCache, format_line, parse_line,
};
pub use error::{Error, Result};
pub use loader::{BINARY_EXTENSION, BinaryPointsLoader, LoadOutcome};
pub use lod::{LodConfig, LodTreeBuilder, batch_length_percent};
pub use name::{BatchName, encode as encode_batch_name};
pub use options::{DEFAULT_BATCH_SIZE, LoadOptions};
pub use resolve::{PathResolver, SearchPathResolver};
pub use sink::{GeometrySink, LoadSummary, draw_ranges};
pub use types::{Batch, ExpiryPolicy, LodChild, LodHierarchy, LodLevel};

// Decode types that appear in this crate's API.
pub use pointbatch_decode::{
    Bounds, Decimation, PointBatch, Precision, RecordFormat, Sampling, convert_text,
};
