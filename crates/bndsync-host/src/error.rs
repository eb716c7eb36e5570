use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("cannot express {path} as a file URL")]
    InvalidPath { path: PathBuf },

    #[error("module '{module}' references unknown {kind} '{name}'")]
    DanglingReference {
        module: String,
        kind: &'static str,
        name: String,
    },

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse project state {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
