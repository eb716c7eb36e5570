use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use bndsync_host::{HostProject, ProjectId};
use bndsync_model::{ExternalWorkspace, ProjectUnit, WorkspaceLoader, CNF_DIR};
use parking_lot::Mutex;

use crate::{ImportError, ImportPipeline, Importer, Reporter};

/// Associates host projects with the Bnd workspace they were imported from.
///
/// Owned by whatever manages project lifecycles; call [`WorkspaceRegistry::forget`]
/// when a project closes.
pub struct WorkspaceRegistry {
    loader: Arc<dyn WorkspaceLoader>,
    workspaces: Mutex<HashMap<ProjectId, Arc<dyn ExternalWorkspace>>>,
    refresh_repositories: bool,
}

impl WorkspaceRegistry {
    pub fn new(loader: Arc<dyn WorkspaceLoader>) -> Self {
        Self {
            loader,
            workspaces: Mutex::new(HashMap::new()),
            refresh_repositories: true,
        }
    }

    /// Whether reimports refresh repository indexes first.
    pub fn with_repository_refresh(mut self, enabled: bool) -> Self {
        self.refresh_repositories = enabled;
        self
    }

    /// Open the workspace rooted at `project`'s base directory, if it has a
    /// `cnf` directory, and remember it for the project.
    pub fn find_workspace(&self, project: &dyn HostProject) -> Option<Arc<dyn ExternalWorkspace>> {
        let base = project.base_path()?;
        if !base.join(CNF_DIR).exists() {
            return None;
        }
        match self.loader.open(base) {
            Ok(workspace) => {
                self.workspaces
                    .lock()
                    .insert(project.id(), Arc::clone(&workspace));
                Some(workspace)
            }
            Err(err) => {
                tracing::error!(
                    target = "bndsync.import",
                    base = %base.display(),
                    error = %err,
                    "cannot open Bnd workspace"
                );
                None
            }
        }
    }

    /// Workspace previously found for `project`. Default projects never have one.
    pub fn workspace(&self, project: &dyn HostProject) -> Option<Arc<dyn ExternalWorkspace>> {
        if project.is_default() {
            return None;
        }
        self.get(&project.id())
    }

    pub fn get(&self, id: &ProjectId) -> Option<Arc<dyn ExternalWorkspace>> {
        self.workspaces.lock().get(id).cloned()
    }

    pub fn forget(&self, id: &ProjectId) -> Option<Arc<dyn ExternalWorkspace>> {
        self.workspaces.lock().remove(id)
    }

    /// Reload the whole workspace and prepare a pipeline importing every
    /// unit, with project setup and a file refresh afterwards.
    pub fn reimport_workspace(
        &self,
        id: &ProjectId,
        reporter: Reporter,
    ) -> Result<ImportPipeline, ImportError> {
        let workspace = self.require(id)?;
        let units = self
            .reload_workspace(&*workspace)
            .map_err(|err| {
                tracing::error!(
                    target = "bndsync.import",
                    ws = %workspace.base().display(),
                    error = %err,
                    "workspace reimport failed"
                );
                err
            })?;

        let importer = Importer::new(workspace, units, reporter);
        Ok(ImportPipeline::new(importer)
            .with_project_setup(true)
            .refresh(true))
    }

    /// Reload the units living in `dirs` (matched by directory name) and
    /// prepare a pipeline importing just those. Unknown directories are
    /// skipped.
    pub fn reimport_projects(
        &self,
        id: &ProjectId,
        dirs: &[PathBuf],
        reporter: Reporter,
    ) -> Result<ImportPipeline, ImportError> {
        let workspace = self.require(id)?;
        let units = self
            .reload_projects(&*workspace, dirs)
            .map_err(|err| {
                tracing::error!(
                    target = "bndsync.import",
                    ws = %workspace.base().display(),
                    projects = ?dirs,
                    error = %err,
                    "project reimport failed"
                );
                err
            })?;

        let importer = Importer::new(workspace, units, reporter);
        Ok(ImportPipeline::new(importer).refresh(true))
    }

    fn require(&self, id: &ProjectId) -> Result<Arc<dyn ExternalWorkspace>, ImportError> {
        self.get(id).ok_or_else(|| ImportError::NoWorkspace {
            project: id.as_str().to_string(),
        })
    }

    fn reload_workspace(
        &self,
        workspace: &dyn ExternalWorkspace,
    ) -> Result<Vec<Arc<dyn ProjectUnit>>, ImportError> {
        workspace.clear();
        workspace.force_refresh()?;

        if self.refresh_repositories {
            refresh_repositories(workspace);
        }

        let units = workspace.projects()?;
        for unit in &units {
            unit.clear();
            unit.force_refresh()?;
        }
        Ok(units)
    }

    fn reload_projects(
        &self,
        workspace: &dyn ExternalWorkspace,
        dirs: &[PathBuf],
    ) -> Result<Vec<Arc<dyn ProjectUnit>>, ImportError> {
        if self.refresh_repositories {
            refresh_repositories(workspace);
        }

        let mut units = Vec::with_capacity(dirs.len());
        for dir in dirs {
            let Some(name) = dir.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            match workspace.project(name) {
                Some(unit) => {
                    unit.clear();
                    unit.force_refresh()?;
                    units.push(unit);
                }
                None => {
                    tracing::debug!(target = "bndsync.import", project = name, "no such Bnd project");
                }
            }
        }
        Ok(units)
    }
}

/// Refresh every repository that supports it. Failures are logged and ignored.
pub fn refresh_repositories(workspace: &dyn ExternalWorkspace) {
    for plugin in workspace.repositories() {
        let Some(refreshable) = plugin.as_refreshable() else {
            continue;
        };
        if let Err(err) = refreshable.refresh() {
            tracing::warn!(target = "bndsync.import", "{err}, plugin={}", plugin.name());
            tracing::debug!(target = "bndsync.import", error = ?err, "repository refresh failed");
        }
    }
}
