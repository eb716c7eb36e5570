use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::Keyed;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RootKind {
    Classes,
    Sources,
}

/// Class and source root URLs of a library or SDK.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootSet {
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub sources: Vec<String>,
}

impl RootSet {
    pub fn urls(&self, kind: RootKind) -> &[String] {
        match kind {
            RootKind::Classes => &self.classes,
            RootKind::Sources => &self.sources,
        }
    }

    pub fn add(&mut self, url: impl Into<String>, kind: RootKind) {
        let url = url.into();
        let urls = self.urls_mut(kind);
        if !urls.contains(&url) {
            urls.push(url);
        }
    }

    pub fn clear(&mut self, kind: RootKind) {
        self.urls_mut(kind).clear();
    }

    fn urls_mut(&mut self, kind: RootKind) -> &mut Vec<String> {
        match kind {
            RootKind::Classes => &mut self.classes,
            RootKind::Sources => &mut self.sources,
        }
    }
}

/// A named library: either shared in the project library table or private to
/// one module (see [`crate::OrderEntry::ModuleLibrary`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Library {
    pub name: String,
    #[serde(default)]
    pub roots: RootSet,
}

impl Library {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            roots: RootSet::default(),
        }
    }
}

impl Keyed for Library {
    fn key(&self) -> &str {
        &self.name
    }
}

/// A platform runtime (JDK or execution environment).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sdk {
    pub name: String,
    pub home: PathBuf,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub roots: RootSet,
}

impl Sdk {
    pub fn new(
        name: impl Into<String>,
        home: impl Into<PathBuf>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            home: home.into(),
            version: version.into(),
            roots: RootSet::default(),
        }
    }
}

impl Keyed for Sdk {
    fn key(&self) -> &str {
        &self.name
    }
}
