use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Java source language level (feature release number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageLevel(pub u16);

impl LanguageLevel {
    pub const JDK_1_8: LanguageLevel = LanguageLevel(8);
    pub const JDK_11: LanguageLevel = LanguageLevel(11);
    pub const JDK_17: LanguageLevel = LanguageLevel(17);

    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        // Bnd workspaces commonly use "1.8" for Java 8.
        let normalized = text.strip_prefix("1.").unwrap_or(text);
        normalized
            .parse::<u16>()
            .ok()
            .filter(|level| *level > 0)
            .map(LanguageLevel)
    }
}

impl fmt::Display for LanguageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 9 {
            write!(f, "1.{}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JavacOptions {
    pub debugging_info: bool,
    pub deprecation: bool,
    #[serde(default)]
    pub additional_options: String,
}

impl Default for JavacOptions {
    fn default() -> Self {
        Self {
            debugging_info: true,
            deprecation: false,
            additional_options: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerSettings {
    /// Project-wide bytecode target (`-target`).
    #[serde(default)]
    pub bytecode_target: Option<String>,
    /// Per-module bytecode target overrides, keyed by module name.
    #[serde(default)]
    pub module_bytecode_targets: BTreeMap<String, String>,
    #[serde(default)]
    pub javac: JavacOptions,
}

impl CompilerSettings {
    /// Set or clear the bytecode target of one module.
    pub fn set_module_bytecode_target(&mut self, module: &str, target: Option<String>) {
        match target {
            Some(target) => {
                self.module_bytecode_targets.insert(module.to_string(), target);
            }
            None => {
                self.module_bytecode_targets.remove(module);
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSettings {
    /// Project default language level; modules inherit it unless they override.
    #[serde(default)]
    pub language_level: Option<LanguageLevel>,
    #[serde(default)]
    pub compiler: CompilerSettings,
}
