use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported snapshot schema version {found} in {path} (expected {expected})")]
    UnsupportedSchema {
        path: PathBuf,
        found: u32,
        expected: u32,
    },

    #[error("{message}")]
    Prepare { unit: String, message: String },

    #[error("project '{unit}' has not been prepared")]
    NotPrepared { unit: String },

    #[error("unknown project '{name}'")]
    UnknownProject { name: String },

    #[error("{message}")]
    Refresh { repository: String, message: String },
}
