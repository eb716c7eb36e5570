use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Declared type of a classpath container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerType {
    /// Another project of the same workspace.
    Project,
    /// A bundle resolved from a repository.
    Repo,
    /// A file referenced by path.
    External,
    /// A library descriptor (`*.lib` file) that was not expanded.
    Library,
    /// A container that failed to resolve.
    Error,
}

impl fmt::Display for ContainerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContainerType::Project => "PROJECT",
            ContainerType::Repo => "REPO",
            ContainerType::External => "EXTERNAL",
            ContainerType::Library => "LIBRARY",
            ContainerType::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// One classpath entry of a project unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    /// Backing file (jar or directory).
    pub file: PathBuf,
    /// Bundle symbolic name.
    pub bsn: String,
    #[serde(default)]
    pub version: String,
    #[serde(rename = "type")]
    pub container_type: ContainerType,
    /// Owning unit for [`ContainerType::Project`] containers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

impl Dependency {
    pub fn repo(
        bsn: impl Into<String>,
        version: impl Into<String>,
        file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            file: file.into(),
            bsn: bsn.into(),
            version: version.into(),
            container_type: ContainerType::Repo,
            project: None,
        }
    }

    pub fn external(file: impl Into<PathBuf>) -> Self {
        let file = file.into();
        let bsn = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            file,
            bsn,
            version: String::new(),
            container_type: ContainerType::External,
            project: None,
        }
    }

    /// A dependency on the generated bundle of another workspace project.
    pub fn project(
        project: impl Into<String>,
        version: impl Into<String>,
        file: impl Into<PathBuf>,
    ) -> Self {
        let project = project.into();
        Self {
            file: file.into(),
            bsn: project.clone(),
            version: version.into(),
            container_type: ContainerType::Project,
            project: Some(project),
        }
    }
}
