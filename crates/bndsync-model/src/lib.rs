//! External (Bnd) build model consumed by the importer.
//!
//! The importer never looks at `.bnd` files itself. It talks to an
//! [`ExternalWorkspace`] and its [`ProjectUnit`]s, which expose the already
//! computed classpaths, directories and properties of each buildable unit.
//! [`SnapshotWorkspace`] is the bundled implementation, backed by a JSON
//! snapshot written next to the workspace configuration.

mod dependency;
mod error;
pub mod properties;
mod snapshot;

pub use dependency::{ContainerType, Dependency};
pub use error::ModelError;
pub use snapshot::{
    read_snapshot, SnapshotLoader, SnapshotProject, SnapshotRepository, SnapshotUnit,
    SnapshotWorkspace, WorkspaceSnapshotFile, WORKSPACE_SNAPSHOT_REL_PATH,
    WORKSPACE_SNAPSHOT_SCHEMA_VERSION,
};

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Name of the workspace configuration directory.
pub const CNF_DIR: &str = "cnf";

/// Workspace-wide build file, relative to the workspace base.
pub const BUILD_FILE: &str = "cnf/build.bnd";

/// Per-project build file, relative to the project base.
pub const BND_FILE: &str = "bnd.bnd";

/// A Bnd workspace: a `cnf` directory plus a set of project units.
pub trait ExternalWorkspace: Send + Sync {
    fn base(&self) -> &Path;

    /// Workspace-level property (e.g. `javac.source`).
    fn property(&self, key: &str) -> Option<String>;

    fn property_or(&self, key: &str, default: &str) -> String {
        self.property(key).unwrap_or_else(|| default.to_string())
    }

    /// All project units of the workspace.
    fn projects(&self) -> Result<Vec<Arc<dyn ProjectUnit>>, ModelError>;

    fn project(&self, name: &str) -> Option<Arc<dyn ProjectUnit>>;

    fn repositories(&self) -> Vec<Arc<dyn RepositoryPlugin>>;

    /// Drop cached state so the next access recomputes it.
    fn clear(&self);

    /// Re-read the workspace configuration from disk.
    fn force_refresh(&self) -> Result<(), ModelError>;
}

/// One buildable project inside an [`ExternalWorkspace`].
///
/// Classpath accessors are only valid after a successful [`ProjectUnit::prepare`].
pub trait ProjectUnit: Send + Sync {
    fn name(&self) -> &str;
    fn base(&self) -> PathBuf;
    fn source_path(&self) -> Vec<PathBuf>;
    fn test_src(&self) -> Option<PathBuf>;
    fn src_output(&self) -> PathBuf;
    fn test_output(&self) -> PathBuf;
    /// Build target directory (generated bundles).
    fn target(&self) -> PathBuf;
    fn property(&self, key: &str) -> Option<String>;

    /// Validate the unit and compute its classpaths.
    fn prepare(&self) -> Result<(), ModelError>;

    fn errors(&self) -> Vec<String>;
    fn warnings(&self) -> Vec<String>;

    fn bootclasspath(&self) -> Result<Vec<Dependency>, ModelError>;
    fn buildpath(&self) -> Result<Vec<Dependency>, ModelError>;
    fn testpath(&self) -> Result<Vec<Dependency>, ModelError>;

    /// Forget the prepared state (classpaths, errors, warnings).
    fn clear(&self);

    fn force_refresh(&self) -> Result<(), ModelError>;
}

/// A repository configured in the workspace.
pub trait RepositoryPlugin: Send + Sync {
    fn name(&self) -> &str;

    /// Repositories that can reload their index expose it here.
    fn as_refreshable(&self) -> Option<&dyn Refreshable> {
        None
    }
}

pub trait Refreshable {
    fn refresh(&self) -> Result<(), ModelError>;
}

/// Opens a workspace rooted at a directory containing [`CNF_DIR`].
pub trait WorkspaceLoader: Send + Sync {
    fn open(&self, base: &Path) -> Result<Arc<dyn ExternalWorkspace>, ModelError>;
}
