use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::properties::BndFile;
use crate::{
    Dependency, ExternalWorkspace, ModelError, ProjectUnit, Refreshable, RepositoryPlugin,
    WorkspaceLoader, BUILD_FILE,
};

/// Schema version for `cnf/.bndsync/workspace.json`.
pub const WORKSPACE_SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Workspace snapshot location, relative to the workspace base.
///
/// The snapshot is written by the Bnd side of the integration after it has
/// computed every project's classpaths, so reading it never runs Bnd itself.
pub const WORKSPACE_SNAPSHOT_REL_PATH: &str = "cnf/.bndsync/workspace.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSnapshotFile {
    pub schema_version: u32,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(default)]
    pub projects: Vec<SnapshotProject>,
    #[serde(default)]
    pub repositories: Vec<SnapshotRepository>,
}

impl Default for WorkspaceSnapshotFile {
    fn default() -> Self {
        Self {
            schema_version: WORKSPACE_SNAPSHOT_SCHEMA_VERSION,
            properties: BTreeMap::new(),
            projects: Vec::new(),
            repositories: Vec::new(),
        }
    }
}

/// A project unit as recorded in the snapshot.
///
/// Relative directories are resolved against the project base; relative
/// dependency files against the workspace base. Directory defaults follow Bnd's
/// (`src`, `test`, `bin`, `bin_test`, `generated`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotProject {
    pub name: String,
    /// Defaults to `<workspace>/<name>`.
    #[serde(default)]
    pub base: Option<PathBuf>,
    #[serde(default = "default_source_path")]
    pub source_path: Vec<PathBuf>,
    #[serde(default = "default_test_src")]
    pub test_src: Option<PathBuf>,
    #[serde(default = "default_src_output")]
    pub src_output: PathBuf,
    #[serde(default = "default_test_output")]
    pub test_output: PathBuf,
    #[serde(default = "default_target")]
    pub target: PathBuf,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    /// Set when Bnd failed to prepare the project.
    #[serde(default)]
    pub prepare_error: Option<String>,
    #[serde(default)]
    pub bootclasspath: Vec<Dependency>,
    #[serde(default)]
    pub buildpath: Vec<Dependency>,
    #[serde(default)]
    pub testpath: Vec<Dependency>,
}

impl SnapshotProject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base: None,
            source_path: default_source_path(),
            test_src: default_test_src(),
            src_output: default_src_output(),
            test_output: default_test_output(),
            target: default_target(),
            properties: BTreeMap::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            prepare_error: None,
            bootclasspath: Vec::new(),
            buildpath: Vec::new(),
            testpath: Vec::new(),
        }
    }

    fn resolved(mut self, workspace_base: &Path) -> Self {
        let base = match self.base.take() {
            Some(base) => absolutize(workspace_base, base),
            None => workspace_base.join(&self.name),
        };
        self.source_path = self
            .source_path
            .into_iter()
            .map(|path| absolutize(&base, path))
            .collect();
        self.test_src = self.test_src.map(|path| absolutize(&base, path));
        self.src_output = absolutize(&base, self.src_output);
        self.test_output = absolutize(&base, self.test_output);
        self.target = absolutize(&base, self.target);
        for dependency in self
            .bootclasspath
            .iter_mut()
            .chain(self.buildpath.iter_mut())
            .chain(self.testpath.iter_mut())
        {
            dependency.file = absolutize(workspace_base, std::mem::take(&mut dependency.file));
        }
        self.base = Some(base);
        self
    }
}

fn default_source_path() -> Vec<PathBuf> {
    vec![PathBuf::from("src")]
}

fn default_test_src() -> Option<PathBuf> {
    Some(PathBuf::from("test"))
}

fn default_src_output() -> PathBuf {
    PathBuf::from("bin")
}

fn default_test_output() -> PathBuf {
    PathBuf::from("bin_test")
}

fn default_target() -> PathBuf {
    PathBuf::from("generated")
}

fn absolutize(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotRepository {
    pub name: String,
    #[serde(default)]
    pub refreshable: bool,
    /// Makes `refresh()` fail with this message.
    #[serde(default)]
    pub refresh_error: Option<String>,
}

pub fn read_snapshot(path: &Path) -> Result<WorkspaceSnapshotFile, ModelError> {
    let bytes = std::fs::read(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file: WorkspaceSnapshotFile =
        serde_json::from_slice(&bytes).map_err(|source| ModelError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    if file.schema_version != WORKSPACE_SNAPSHOT_SCHEMA_VERSION {
        return Err(ModelError::UnsupportedSchema {
            path: path.to_path_buf(),
            found: file.schema_version,
            expected: WORKSPACE_SNAPSHOT_SCHEMA_VERSION,
        });
    }
    Ok(file)
}

type SharedProperties = Arc<RwLock<BTreeMap<String, String>>>;

/// [`ExternalWorkspace`] backed by a [`WorkspaceSnapshotFile`].
pub struct SnapshotWorkspace {
    base: PathBuf,
    snapshot_path: Option<PathBuf>,
    properties: SharedProperties,
    units: RwLock<Vec<Arc<SnapshotUnit>>>,
    repositories: RwLock<Vec<Arc<SnapshotRepositoryPlugin>>>,
    refreshes: Mutex<HashMap<String, Arc<AtomicUsize>>>,
}

impl SnapshotWorkspace {
    /// Open the snapshot stored under `base`.
    pub fn open(base: impl Into<PathBuf>) -> Result<Self, ModelError> {
        let base = base.into();
        let path = base.join(WORKSPACE_SNAPSHOT_REL_PATH);
        let file = read_snapshot(&path)?;
        Ok(Self::build(base, Some(path), file))
    }

    /// Workspace over an in-memory snapshot. `force_refresh` keeps the given
    /// contents unless a snapshot file appears on disk.
    pub fn from_snapshot(base: impl Into<PathBuf>, file: WorkspaceSnapshotFile) -> Self {
        let base = base.into();
        let path = base.join(WORKSPACE_SNAPSHOT_REL_PATH);
        Self::build(base, Some(path), file)
    }

    fn build(base: PathBuf, snapshot_path: Option<PathBuf>, file: WorkspaceSnapshotFile) -> Self {
        let workspace = Self {
            base,
            snapshot_path,
            properties: Arc::new(RwLock::new(BTreeMap::new())),
            units: RwLock::new(Vec::new()),
            repositories: RwLock::new(Vec::new()),
            refreshes: Mutex::new(HashMap::new()),
        };
        workspace.apply(file);
        workspace
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    /// How many times the named repository has been refreshed.
    pub fn refresh_count(&self, repository: &str) -> usize {
        self.refreshes
            .lock()
            .get(repository)
            .map_or(0, |count| count.load(Ordering::SeqCst))
    }

    fn apply(&self, file: WorkspaceSnapshotFile) {
        let mut properties = BTreeMap::new();
        let build_file = self.base.join(BUILD_FILE);
        if build_file.is_file() {
            match BndFile::read(&build_file) {
                Ok(parsed) => {
                    for entry in parsed.entries {
                        properties.insert(entry.key, entry.value);
                    }
                }
                Err(err) => {
                    tracing::debug!(
                        target = "bndsync.model",
                        path = %build_file.display(),
                        error = %err,
                        "ignoring unreadable workspace build file"
                    );
                }
            }
        }
        properties.extend(file.properties);
        *self.properties.write() = properties;

        let mut units = self.units.write();
        let mut next = Vec::with_capacity(file.projects.len());
        for project in file.projects {
            match units.iter().find(|unit| unit.name == project.name) {
                Some(existing) => {
                    existing.replace(project);
                    next.push(Arc::clone(existing));
                }
                None => next.push(Arc::new(SnapshotUnit::new(
                    project,
                    &self.base,
                    self.snapshot_path.clone(),
                    Arc::clone(&self.properties),
                ))),
            }
        }
        *units = next;

        let mut refreshes = self.refreshes.lock();
        *self.repositories.write() = file
            .repositories
            .into_iter()
            .map(|data| {
                let count = Arc::clone(refreshes.entry(data.name.clone()).or_default());
                Arc::new(SnapshotRepositoryPlugin {
                    data,
                    refreshes: count,
                })
            })
            .collect();
    }
}

impl ExternalWorkspace for SnapshotWorkspace {
    fn base(&self) -> &Path {
        &self.base
    }

    fn property(&self, key: &str) -> Option<String> {
        self.properties.read().get(key).cloned()
    }

    fn projects(&self) -> Result<Vec<Arc<dyn ProjectUnit>>, ModelError> {
        Ok(self
            .units
            .read()
            .iter()
            .map(|unit| Arc::clone(unit) as Arc<dyn ProjectUnit>)
            .collect())
    }

    fn project(&self, name: &str) -> Option<Arc<dyn ProjectUnit>> {
        self.units
            .read()
            .iter()
            .find(|unit| unit.name == name)
            .map(|unit| Arc::clone(unit) as Arc<dyn ProjectUnit>)
    }

    fn repositories(&self) -> Vec<Arc<dyn RepositoryPlugin>> {
        self.repositories
            .read()
            .iter()
            .map(|repo| Arc::clone(repo) as Arc<dyn RepositoryPlugin>)
            .collect()
    }

    fn clear(&self) {
        for unit in self.units.read().iter() {
            unit.clear();
        }
    }

    fn force_refresh(&self) -> Result<(), ModelError> {
        match &self.snapshot_path {
            Some(path) if path.is_file() => {
                let file = read_snapshot(path)?;
                self.apply(file);
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

struct UnitState {
    project: SnapshotProject,
    prepared: bool,
}

/// A [`ProjectUnit`] of a [`SnapshotWorkspace`].
pub struct SnapshotUnit {
    name: String,
    workspace_base: PathBuf,
    snapshot_path: Option<PathBuf>,
    workspace_properties: SharedProperties,
    state: RwLock<UnitState>,
}

impl SnapshotUnit {
    fn new(
        project: SnapshotProject,
        workspace_base: &Path,
        snapshot_path: Option<PathBuf>,
        workspace_properties: SharedProperties,
    ) -> Self {
        Self {
            name: project.name.clone(),
            workspace_base: workspace_base.to_path_buf(),
            snapshot_path,
            workspace_properties,
            state: RwLock::new(UnitState {
                project: project.resolved(workspace_base),
                prepared: false,
            }),
        }
    }

    fn replace(&self, project: SnapshotProject) {
        let mut state = self.state.write();
        state.project = project.resolved(&self.workspace_base);
        state.prepared = false;
    }

    fn classpath(
        &self,
        select: impl FnOnce(&SnapshotProject) -> &Vec<Dependency>,
    ) -> Result<Vec<Dependency>, ModelError> {
        let state = self.state.read();
        if !state.prepared {
            return Err(ModelError::NotPrepared {
                unit: self.name.clone(),
            });
        }
        Ok(select(&state.project).clone())
    }
}

impl ProjectUnit for SnapshotUnit {
    fn name(&self) -> &str {
        &self.name
    }

    fn base(&self) -> PathBuf {
        let state = self.state.read();
        state
            .project
            .base
            .clone()
            .unwrap_or_else(|| self.workspace_base.join(&self.name))
    }

    fn source_path(&self) -> Vec<PathBuf> {
        self.state.read().project.source_path.clone()
    }

    fn test_src(&self) -> Option<PathBuf> {
        self.state.read().project.test_src.clone()
    }

    fn src_output(&self) -> PathBuf {
        self.state.read().project.src_output.clone()
    }

    fn test_output(&self) -> PathBuf {
        self.state.read().project.test_output.clone()
    }

    fn target(&self) -> PathBuf {
        self.state.read().project.target.clone()
    }

    fn property(&self, key: &str) -> Option<String> {
        if let Some(value) = self.state.read().project.properties.get(key) {
            return Some(value.clone());
        }
        self.workspace_properties.read().get(key).cloned()
    }

    fn prepare(&self) -> Result<(), ModelError> {
        let mut state = self.state.write();
        if state.prepared {
            return Ok(());
        }

        if let Some(message) = &state.project.prepare_error {
            return Err(ModelError::Prepare {
                unit: self.name.clone(),
                message: message.clone(),
            });
        }

        let base = state
            .project
            .base
            .clone()
            .unwrap_or_else(|| self.workspace_base.join(&self.name));
        if !base.is_dir() {
            return Err(ModelError::Prepare {
                unit: self.name.clone(),
                message: format!("project directory {} does not exist", base.display()),
            });
        }

        state.prepared = true;
        Ok(())
    }

    fn errors(&self) -> Vec<String> {
        let state = self.state.read();
        if state.prepared {
            state.project.errors.clone()
        } else {
            Vec::new()
        }
    }

    fn warnings(&self) -> Vec<String> {
        let state = self.state.read();
        if state.prepared {
            state.project.warnings.clone()
        } else {
            Vec::new()
        }
    }

    fn bootclasspath(&self) -> Result<Vec<Dependency>, ModelError> {
        self.classpath(|project| &project.bootclasspath)
    }

    fn buildpath(&self) -> Result<Vec<Dependency>, ModelError> {
        self.classpath(|project| &project.buildpath)
    }

    fn testpath(&self) -> Result<Vec<Dependency>, ModelError> {
        self.classpath(|project| &project.testpath)
    }

    fn clear(&self) {
        self.state.write().prepared = false;
    }

    fn force_refresh(&self) -> Result<(), ModelError> {
        let Some(path) = self.snapshot_path.as_deref().filter(|path| path.is_file()) else {
            return Ok(());
        };
        let file = read_snapshot(path)?;
        let project = file
            .projects
            .into_iter()
            .find(|project| project.name == self.name)
            .ok_or_else(|| ModelError::UnknownProject {
                name: self.name.clone(),
            })?;
        self.replace(project);
        Ok(())
    }
}

struct SnapshotRepositoryPlugin {
    data: SnapshotRepository,
    refreshes: Arc<AtomicUsize>,
}

impl RepositoryPlugin for SnapshotRepositoryPlugin {
    fn name(&self) -> &str {
        &self.data.name
    }

    fn as_refreshable(&self) -> Option<&dyn Refreshable> {
        if self.data.refreshable {
            Some(self)
        } else {
            None
        }
    }
}

impl Refreshable for SnapshotRepositoryPlugin {
    fn refresh(&self) -> Result<(), ModelError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        match &self.data.refresh_error {
            Some(message) => Err(ModelError::Refresh {
                repository: self.data.name.clone(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Opens [`SnapshotWorkspace`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotLoader;

impl WorkspaceLoader for SnapshotLoader {
    fn open(&self, base: &Path) -> Result<Arc<dyn ExternalWorkspace>, ModelError> {
        Ok(Arc::new(SnapshotWorkspace::open(base)?))
    }
}
