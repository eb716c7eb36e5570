use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    CompilerSettings, HostError, HostModule, KeyedTable, Library, OrderEntry, ProjectSettings,
    Sdk,
};

/// Stable identity of a host project, used to associate per-project state.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Working copy of the mutable parts of a host project.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectModification {
    pub modules: KeyedTable<HostModule>,
    pub libraries: KeyedTable<Library>,
    pub sdks: KeyedTable<Sdk>,
    pub compiler: CompilerSettings,
}

impl ProjectModification {
    /// Every module, library and SDK named by an order entry must exist.
    pub fn validate(&self) -> Result<(), HostError> {
        for module in self.modules.iter() {
            for entry in &module.order_entries {
                let (kind, name, known) = match entry {
                    OrderEntry::Module { module: name, .. } => {
                        ("module", name, self.modules.contains(name))
                    }
                    OrderEntry::Library { library, .. } => {
                        ("library", library, self.libraries.contains(library))
                    }
                    OrderEntry::ModuleSdk { name } => ("sdk", name, self.sdks.contains(name)),
                    OrderEntry::ModuleSource
                    | OrderEntry::InheritedSdk
                    | OrderEntry::ModuleLibrary { .. } => continue,
                };
                if !known {
                    return Err(HostError::DanglingReference {
                        module: module.name.clone(),
                        kind,
                        name: name.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// A host project the importer can read settings from and commit into.
///
/// Implementations are only touched from one thread at a time (the model
/// thread); `Send` lets that thread own them.
pub trait HostProject: Send {
    fn id(&self) -> ProjectId;

    fn name(&self) -> &str;

    fn base_path(&self) -> Option<&Path>;

    /// The template project that has no files of its own.
    fn is_default(&self) -> bool {
        false
    }

    fn is_disposed(&self) -> bool {
        false
    }

    fn settings(&self) -> &ProjectSettings;

    fn settings_mut(&mut self) -> &mut ProjectSettings;

    fn modifiable_model(&self) -> ProjectModification;

    /// Apply `modification` as one unit. On error nothing is applied.
    fn commit(&mut self, modification: ProjectModification) -> Result<(), HostError>;

    /// Ask the host to rescan files changed by the import.
    fn refresh_files(&mut self) {}
}

/// A [`HostProject`] kept in memory and persisted as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InMemoryProject {
    name: String,
    base_path: PathBuf,
    #[serde(default)]
    settings: ProjectSettings,
    #[serde(default)]
    modules: KeyedTable<HostModule>,
    #[serde(default)]
    libraries: KeyedTable<Library>,
    #[serde(default)]
    sdks: KeyedTable<Sdk>,
    #[serde(skip)]
    disposed: bool,
    #[serde(skip)]
    commits: usize,
    #[serde(skip)]
    file_refreshes: usize,
}

impl InMemoryProject {
    pub fn new(name: impl Into<String>, base_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            base_path: base_path.into(),
            settings: ProjectSettings::default(),
            modules: KeyedTable::new(),
            libraries: KeyedTable::new(),
            sdks: KeyedTable::new(),
            disposed: false,
            commits: 0,
            file_refreshes: 0,
        }
    }

    pub fn load(path: &Path) -> Result<Self, HostError> {
        let bytes = std::fs::read(path).map_err(|source| HostError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| HostError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), HostError> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| HostError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_vec_pretty(self).map_err(|source| HostError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| HostError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn modules(&self) -> &KeyedTable<HostModule> {
        &self.modules
    }

    pub fn module(&self, name: &str) -> Option<&HostModule> {
        self.modules.find(name)
    }

    pub fn libraries(&self) -> &KeyedTable<Library> {
        &self.libraries
    }

    pub fn library(&self, name: &str) -> Option<&Library> {
        self.libraries.find(name)
    }

    pub fn sdks(&self) -> &KeyedTable<Sdk> {
        &self.sdks
    }

    pub fn sdk(&self, name: &str) -> Option<&Sdk> {
        self.sdks.find(name)
    }

    pub fn dispose(&mut self) {
        self.disposed = true;
    }

    pub fn commit_count(&self) -> usize {
        self.commits
    }

    pub fn file_refresh_count(&self) -> usize {
        self.file_refreshes
    }
}

impl HostProject for InMemoryProject {
    fn id(&self) -> ProjectId {
        ProjectId::new(self.base_path.to_string_lossy())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn base_path(&self) -> Option<&Path> {
        Some(&self.base_path)
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn settings(&self) -> &ProjectSettings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut ProjectSettings {
        &mut self.settings
    }

    fn modifiable_model(&self) -> ProjectModification {
        ProjectModification {
            modules: self.modules.clone(),
            libraries: self.libraries.clone(),
            sdks: self.sdks.clone(),
            compiler: self.settings.compiler.clone(),
        }
    }

    fn commit(&mut self, modification: ProjectModification) -> Result<(), HostError> {
        modification.validate()?;
        self.modules = modification.modules;
        self.libraries = modification.libraries;
        self.sdks = modification.sdks;
        self.settings.compiler = modification.compiler;
        self.commits += 1;
        tracing::debug!(
            target = "bndsync.host",
            project = %self.name,
            modules = self.modules.len(),
            libraries = self.libraries.len(),
            sdks = self.sdks.len(),
            "committed project model"
        );
        Ok(())
    }

    fn refresh_files(&mut self) {
        self.file_refreshes += 1;
    }
}
