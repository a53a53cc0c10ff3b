//! Cache abstractions for batch bounds.
//!
//! Computing the extents of a batch means decoding it, which for large files
//! is expensive. Size-only requests consult a [`BoundsCache`] first and only
//! decode on a miss.
//!
//! # Implementations
//!
//! - [`FilesystemBoundsCache`]: `bounds/` files next to the batch
//! - [`MemoryBoundsCache`]: In-memory map, shared between clones
//! - [`NoBoundsCache`]: Passthrough implementation that caches nothing
//!
//! Entries are keyed by batch name only. Nothing ties an entry to the
//! contents of its source file, so a rewritten file keeps serving the bounds
//! cached for its previous contents until the entry is deleted.

use std::{
    collections::HashMap,
    fs,
    io,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use pointbatch_decode::Bounds;

use crate::error::{Error, Result};

/// Name of the directory holding bounds files, beside the batch files.
pub const BOUNDS_DIR: &str = "bounds";

/// Extension of bounds files.
pub const BOUNDS_EXTENSION: &str = "bounds";

/// A cache for storing batch bounds.
///
/// The key is the batch's name placed in the directory of its source file,
/// e.g. `/data/scan.0-1-5.xyzb`.
pub trait BoundsCache {
    /// Get bounds from the cache.
    ///
    /// Returns `Ok(None)` if nothing is cached for `batch`.
    fn get(&self, batch: &Path) -> Result<Option<Bounds>>;

    /// Store bounds, replacing any existing entry.
    fn put(&self, batch: &Path, bounds: &Bounds) -> Result<()>;
}

/// A cache that stores nothing (passthrough).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBoundsCache;

impl BoundsCache for NoBoundsCache {
    fn get(&self, _batch: &Path) -> Result<Option<Bounds>> {
        Ok(None)
    }

    fn put(&self, _batch: &Path, _bounds: &Bounds) -> Result<()> {
        Ok(())
    }
}

/// An in-memory cache.
///
/// Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryBoundsCache {
    entries: Arc<RwLock<HashMap<PathBuf, Bounds>>>,
}

impl MemoryBoundsCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().map_or(0, |entries| entries.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BoundsCache for MemoryBoundsCache {
    fn get(&self, batch: &Path) -> Result<Option<Bounds>> {
        let entries = self.entries.read().map_err(|e| Error::Cache {
            operation: "get",
            path: batch.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(entries.get(batch).copied())
    }

    fn put(&self, batch: &Path, bounds: &Bounds) -> Result<()> {
        let mut entries = self.entries.write().map_err(|e| Error::Cache {
            operation: "put",
            path: batch.to_path_buf(),
            message: e.to_string(),
        })?;
        entries.insert(batch.to_path_buf(), *bounds);
        Ok(())
    }
}

/// Disk-based cache of one small text file per batch.
///
/// The bounds of `{dir}/{stem}.{ext}` live in `{dir}/bounds/{stem}.bounds` as
/// a single line of fourteen comma-separated values:
///
/// ```text
/// xmin,xmax,ymin,ymax,zmin,zmax,rmin,rmax,gmin,gmax,bmin,bmax,amin,amax
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct FilesystemBoundsCache;

impl FilesystemBoundsCache {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Location of the bounds file for a batch.
    #[must_use]
    pub fn entry_path(batch: &Path) -> PathBuf {
        let dir = batch.parent().unwrap_or_else(|| Path::new(""));
        let stem = batch.file_stem().unwrap_or(batch.as_os_str());
        let mut file_name = stem.to_os_string();
        file_name.push(".");
        file_name.push(BOUNDS_EXTENSION);
        dir.join(BOUNDS_DIR).join(file_name)
    }
}

impl BoundsCache for FilesystemBoundsCache {
    fn get(&self, batch: &Path) -> Result<Option<Bounds>> {
        let path = Self::entry_path(batch);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::Cache {
                    operation: "read",
                    path,
                    message: e.to_string(),
                });
            }
        };

        match parse_line(&contents) {
            Some(bounds) => Ok(Some(bounds)),
            None => {
                tracing::warn!(path = %path.display(), "ignoring unreadable bounds file");
                Ok(None)
            }
        }
    }

    fn put(&self, batch: &Path, bounds: &Bounds) -> Result<()> {
        let path = Self::entry_path(batch);
        let cache_error = |operation, e: io::Error| Error::Cache {
            operation,
            path: path.clone(),
            message: e.to_string(),
        };

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| cache_error("create directory", e))?;
        }
        fs::write(&path, format_line(bounds)).map_err(|e| cache_error("write", e))?;

        tracing::debug!(path = %path.display(), "wrote bounds file");
        Ok(())
    }
}

/// Format bounds as the fourteen-value cache line.
#[must_use]
pub fn format_line(bounds: &Bounds) -> String {
    let values: Vec<String> = bounds.to_array().iter().map(f32::to_string).collect();
    let mut line = values.join(",");
    line.push('\n');
    line
}

/// Parse a fourteen-value cache line.
#[must_use]
pub fn parse_line(line: &str) -> Option<Bounds> {
    let mut values = [0.0f32; 14];
    let mut fields = line.trim().split(',');
    for value in &mut values {
        *value = fields.next()?.trim().parse().ok()?;
    }
    if fields.next().is_some() {
        return None;
    }
    Some(Bounds::from_array(values))
}
