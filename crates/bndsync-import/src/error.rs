use bndsync_host::HostError;
use bndsync_model::{ContainerType, ModelError};

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// A unit failed validation; the whole cycle was aborted before any
    /// host mutation.
    #[error("cannot import project '{unit}': {message}")]
    UnitPreparation { unit: String, message: String },

    #[error("import was cancelled")]
    Cancelled,

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Host(#[from] HostError),

    /// Headless mode turns reported errors and warnings into a failure.
    #[error("import reported problems:\n{}", .messages.join("\n"))]
    Reported { messages: Vec<String> },

    #[error("project '{project}' has no associated Bnd workspace")]
    NoWorkspace { project: String },

    #[error("project '{project}' has no base directory")]
    NoBasePath { project: String },

    #[error("the model thread is no longer running")]
    ModelThreadGone,
}

/// A single classpath entry that could not be turned into a host entry.
///
/// Collected per unit; never aborts the unit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DependencyWarning {
    #[error("Cannot resolve {bsn}:{version}: {path}")]
    Unrepresentable {
        bsn: String,
        version: String,
        path: String,
    },

    #[error("Unknown module '{name}'")]
    UnknownModule { name: String },

    #[error("Unknown dependency '{bsn}' of type {container_type}")]
    UnknownType {
        bsn: String,
        container_type: ContainerType,
    },
}
