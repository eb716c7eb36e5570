use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::Archive;

/// In-archive directory holding a bundle's own sources.
pub const SRC_ROOT: &str = "OSGI-OPT/src";

/// Per-run memo of embedded source roots, keyed by archive path.
///
/// Absence is remembered too, including archives that could not be read, so a
/// broken jar is not reopened for every unit that references it. Entries are
/// never invalidated: files are assumed not to change during one import.
#[derive(Debug, Default)]
pub struct SourceRootIndex {
    roots: HashMap<PathBuf, Option<&'static str>>,
}

impl SourceRootIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Probe `path` unless it was probed before. Only regular `.jar` files are
    /// considered; anything else has no embedded sources.
    pub fn probe(&mut self, path: &Path) -> Option<&'static str> {
        if let Some(known) = self.roots.get(path) {
            return *known;
        }

        if !is_jar_file(path) {
            return None;
        }

        let found = match Archive::new(path).contains_dir(SRC_ROOT) {
            Ok(true) => Some(SRC_ROOT),
            Ok(false) => None,
            Err(err) => {
                tracing::warn!(
                    target = "bndsync.archive",
                    path = %path.display(),
                    error = %err,
                    "cannot inspect archive; assuming no embedded sources"
                );
                tracing::debug!(target = "bndsync.archive", error = ?err, "archive probe failed");
                None
            }
        };
        self.roots.insert(path.to_path_buf(), found);
        found
    }

    /// Previously probed source root of `path`, without touching the file.
    pub fn source_root(&self, path: &Path) -> Option<&'static str> {
        self.roots.get(path).copied().flatten()
    }

    pub fn is_probed(&self, path: &Path) -> bool {
        self.roots.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

fn is_jar_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("jar"))
}
