//! Imports a Bnd workspace into a host (IDE) project model.
//!
//! One cycle resolves the selected units of the workspace, then builds every
//! module skeleton, wires the dependencies of each unit and commits the whole
//! modification at once:
//!
//! ```text
//! Idle -> Resolving -> (Failed | Resolved) -> BuildingStructure -> Done
//! ```
//!
//! [`ImportPipeline`] runs a cycle either inline ([`Execution::Synchronous`])
//! or with resolution on a worker and structure building on the model thread
//! ([`Execution::Background`]).

mod classify;
mod error;
mod execution;
mod materialize;
mod module_builder;
mod pipeline;
mod progress;
mod registry;
mod reorder;
mod report;

pub use classify::{classify, Action, DependencyKind, SkipReason};
pub use error::{DependencyWarning, ImportError};
pub use execution::{
    BackgroundExecutor, Execution, ImportHandle, ImportPipeline, ModelDispatcher, ModelThread,
};
pub use materialize::{library_name, EntryMaterializer, Materialized};
pub use module_builder::{build_module, create_root_module, module_file};
pub use pipeline::{setup_project, ImportState, ImportSummary, Importer, ResolvedImport};
pub use progress::{Progress, ProgressEvent, ProgressId, ProgressReceiver, ProgressSender};
pub use registry::{refresh_repositories, WorkspaceRegistry};
pub use reorder::{reorder, weight};
pub use report::{
    CollectingSink, CycleReport, Notification, NotificationSink, Reporter, Severity,
    DEFAULT_NOTIFICATION_GROUP,
};

pub use tokio_util::sync::CancellationToken;

/// Prefix of library and SDK names created by the importer.
pub const BND_LIB_PREFIX: &str = "bnd:";

/// Symbolic name of the execution environment container.
pub const JDK_DEPENDENCY: &str = "ee.j2se";

pub const JAVAC_SOURCE: &str = "javac.source";
pub const JAVAC_TARGET: &str = "javac.target";

/// Facet type of the OSGi packaging facet, dropped from imported modules.
pub const OSGI_FACET_ID: &str = "osmorc";
