//! Logical-to-physical path resolution.

use std::path::{Path, PathBuf};

/// Resolves a logical file name to a file on disk.
///
/// Implemented by the host's data manager; [`SearchPathResolver`] covers the
/// common case of a list of data directories.
pub trait PathResolver {
    /// Returns the physical path of `name`, or `None` if it cannot be found.
    fn resolve(&self, name: &Path) -> Option<PathBuf>;
}

impl<F> PathResolver for F
where
    F: Fn(&Path) -> Option<PathBuf>,
{
    fn resolve(&self, name: &Path) -> Option<PathBuf> {
        self(name)
    }
}

/// Looks a name up as given, then under each search directory in order.
#[derive(Debug, Clone, Default)]
pub struct SearchPathResolver {
    roots: Vec<PathBuf>,
}

impl SearchPathResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory to search.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.roots.push(root.into());
        self
    }
}

impl PathResolver for SearchPathResolver {
    fn resolve(&self, name: &Path) -> Option<PathBuf> {
        if name.is_absolute() || self.roots.is_empty() {
            return name.is_file().then(|| name.to_path_buf());
        }
        self.roots
            .iter()
            .map(|root| root.join(name))
            .find(|candidate| candidate.is_file())
    }
}
