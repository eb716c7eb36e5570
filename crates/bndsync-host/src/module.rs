use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{Keyed, LanguageLevel, Library};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DependencyScope {
    Compile,
    Test,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFolder {
    pub url: String,
    pub is_test: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRoot {
    pub url: String,
    #[serde(default)]
    pub source_folders: Vec<SourceFolder>,
    #[serde(default)]
    pub exclude_folders: Vec<String>,
}

impl ContentRoot {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            source_folders: Vec::new(),
            exclude_folders: Vec::new(),
        }
    }

    pub fn add_source_folder(&mut self, url: impl Into<String>, is_test: bool) {
        self.source_folders.push(SourceFolder {
            url: url.into(),
            is_test,
        });
    }

    pub fn add_exclude_folder(&mut self, url: impl Into<String>) {
        self.exclude_folders.push(url.into());
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerOutput {
    /// Use the project-wide output directory instead of the paths below.
    pub inherit: bool,
    pub exclude_output: bool,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub test_output: Option<String>,
}

impl Default for CompilerOutput {
    fn default() -> Self {
        Self {
            inherit: true,
            exclude_output: true,
            output: None,
            test_output: None,
        }
    }
}

/// One element of a module's ordered dependency list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum OrderEntry {
    /// The module's own sources.
    ModuleSource,
    /// The project default SDK.
    InheritedSdk,
    ModuleSdk {
        name: String,
    },
    Module {
        module: String,
        scope: DependencyScope,
    },
    /// Reference to a project-level library.
    Library {
        library: String,
        scope: DependencyScope,
    },
    /// Library owned by this module alone.
    ModuleLibrary {
        library: Library,
        scope: DependencyScope,
    },
}

impl OrderEntry {
    pub fn is_sdk(&self) -> bool {
        matches!(self, OrderEntry::InheritedSdk | OrderEntry::ModuleSdk { .. })
    }

    pub fn is_module_source(&self) -> bool {
        matches!(self, OrderEntry::ModuleSource)
    }

    pub fn scope(&self) -> Option<DependencyScope> {
        match self {
            OrderEntry::Module { scope, .. }
            | OrderEntry::Library { scope, .. }
            | OrderEntry::ModuleLibrary { scope, .. } => Some(*scope),
            OrderEntry::ModuleSource | OrderEntry::InheritedSdk | OrderEntry::ModuleSdk { .. } => {
                None
            }
        }
    }
}

/// A module record of the host project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostModule {
    pub name: String,
    /// Module descriptor location (`<dir>/<name>.iml`).
    pub file: PathBuf,
    #[serde(default)]
    pub content_roots: Vec<ContentRoot>,
    pub order_entries: Vec<OrderEntry>,
    /// `None` inherits the project language level.
    #[serde(default)]
    pub language_level: Option<LanguageLevel>,
    #[serde(default)]
    pub compiler_output: CompilerOutput,
    /// Facet type ids attached to the module.
    #[serde(default)]
    pub facets: BTreeSet<String>,
}

impl HostModule {
    pub fn new(name: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
            content_roots: Vec::new(),
            order_entries: vec![OrderEntry::ModuleSource, OrderEntry::InheritedSdk],
            language_level: None,
            compiler_output: CompilerOutput::default(),
            facets: BTreeSet::new(),
        }
    }

    pub fn add_content_root(&mut self, url: impl Into<String>) -> &mut ContentRoot {
        self.content_roots.push(ContentRoot::new(url));
        let last = self.content_roots.len() - 1;
        &mut self.content_roots[last]
    }

    pub fn clear_content_roots(&mut self) {
        self.content_roots.clear();
    }

    pub fn sdk(&self) -> Option<&OrderEntry> {
        self.order_entries.iter().find(|entry| entry.is_sdk())
    }

    /// Use the project SDK.
    pub fn inherit_sdk(&mut self) {
        self.replace_sdk(OrderEntry::InheritedSdk);
    }

    pub fn set_sdk(&mut self, name: impl Into<String>) {
        self.replace_sdk(OrderEntry::ModuleSdk { name: name.into() });
    }

    fn replace_sdk(&mut self, sdk: OrderEntry) {
        let mut replaced = false;
        self.order_entries.retain_mut(|entry| {
            if !entry.is_sdk() {
                return true;
            }
            if replaced {
                return false;
            }
            *entry = sdk.clone();
            replaced = true;
            true
        });
        if !replaced {
            self.order_entries.push(sdk);
        }
    }

    pub fn has_module_dependency(&self, module: &str) -> bool {
        self.order_entries
            .iter()
            .any(|entry| matches!(entry, OrderEntry::Module { module: name, .. } if name == module))
    }

    pub fn add_entry(&mut self, entry: OrderEntry) {
        self.order_entries.push(entry);
    }

    /// Replace the order entries with a permutation of themselves.
    pub fn rearrange_order_entries(&mut self, entries: Vec<OrderEntry>) {
        debug_assert_eq!(entries.len(), self.order_entries.len());
        self.order_entries = entries;
    }
}

impl Keyed for HostModule {
    fn key(&self) -> &str {
        &self.name
    }
}
