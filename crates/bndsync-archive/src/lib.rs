//! Dependency archives (bundles) and the embedded-source probe.
//!
//! Bundles built with Bnd may carry their own sources under `OSGI-OPT/src`.
//! [`SourceRootIndex`] remembers, per archive path, whether that directory is
//! present so every archive is opened at most once per import run.

mod index;

pub use index::{SourceRootIndex, SRC_ROOT};

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::Context;
use zip::ZipArchive;

/// A jar file or an exploded bundle directory.
#[derive(Clone, Debug)]
pub struct Archive {
    path: PathBuf,
}

impl Archive {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the archive contains the directory `dir` (`a/b`, no trailing slash).
    ///
    /// Jars do not always carry explicit directory entries, so any entry below
    /// `dir` counts as well.
    pub fn contains_dir(&self, dir: &str) -> anyhow::Result<bool> {
        if self.path.is_dir() {
            return Ok(self.path.join(dir).is_dir());
        }

        let file = File::open(&self.path)
            .with_context(|| format!("failed to open archive {}", self.path.display()))?;
        let zip = ZipArchive::new(file)
            .with_context(|| format!("failed to read zip {}", self.path.display()))?;

        let prefix = format!("{}/", dir.trim_end_matches('/'));
        let found = zip
            .file_names()
            .map(|name| name.strip_prefix('/').unwrap_or(name))
            .any(|name| name.starts_with(&prefix));
        Ok(found)
    }
}
