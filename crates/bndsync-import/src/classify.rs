use std::collections::HashSet;

use bndsync_model::{ContainerType, Dependency};

use crate::{DependencyWarning, JDK_DEPENDENCY};

/// How a dependency is represented in the host model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyKind {
    /// Execution environment; becomes the module SDK.
    PlatformRuntime,
    /// Another unit of the workspace; a module reference plus its generated bundle.
    WorkspaceModule,
    /// Shared project library keyed by `bsn:version`.
    RepositoryArtifact,
    /// Module-private library named after the file.
    ExternalFile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Already wired from the boot classpath.
    BootPath,
    /// A unit depending on its own bundle.
    SelfReference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Skip(SkipReason),
    Materialize(DependencyKind),
}

/// Decide what to do with one classpath entry of `unit`.
///
/// `excluded` holds the unit's boot classpath when classifying its build and
/// test paths.
pub fn classify(
    dependency: &Dependency,
    excluded: &HashSet<Dependency>,
    unit: &str,
) -> Result<Action, DependencyWarning> {
    if excluded.contains(dependency) {
        return Ok(Action::Skip(SkipReason::BootPath));
    }
    if dependency.container_type == ContainerType::Project
        && dependency.project.as_deref() == Some(unit)
    {
        return Ok(Action::Skip(SkipReason::SelfReference));
    }

    // Bnd reports unresolvable containers with the error text in place of the path.
    if dependency.file.to_string_lossy().contains(": ") {
        return Err(unrepresentable(dependency));
    }

    if dependency.bsn == JDK_DEPENDENCY {
        return Ok(Action::Materialize(DependencyKind::PlatformRuntime));
    }

    let kind = match dependency.container_type {
        ContainerType::Project => DependencyKind::WorkspaceModule,
        ContainerType::Repo => DependencyKind::RepositoryArtifact,
        ContainerType::External => DependencyKind::ExternalFile,
        ContainerType::Library | ContainerType::Error => {
            return Err(DependencyWarning::UnknownType {
                bsn: dependency.bsn.clone(),
                container_type: dependency.container_type,
            })
        }
    };
    Ok(Action::Materialize(kind))
}

pub(crate) fn unrepresentable(dependency: &Dependency) -> DependencyWarning {
    DependencyWarning::Unrepresentable {
        bsn: dependency.bsn.clone(),
        version: dependency.version.clone(),
        path: dependency.file.to_string_lossy().into_owned(),
    }
}
