//! Host (IDE) project model written by the importer.
//!
//! The model is a set of name-keyed registries: modules, project libraries
//! and SDKs. Importers never mutate a host directly; they take a
//! [`ProjectModification`] from [`HostProject::modifiable_model`], edit it, and
//! hand it back through [`HostProject::commit`], which applies all of it or
//! nothing.

mod error;
mod library;
mod module;
mod project;
mod registry;
mod settings;
mod url;

pub use error::HostError;
pub use library::{Library, RootKind, RootSet, Sdk};
pub use module::{
    CompilerOutput, ContentRoot, DependencyScope, HostModule, OrderEntry, SourceFolder,
};
pub use project::{HostProject, InMemoryProject, ProjectId, ProjectModification};
pub use registry::{Keyed, KeyedTable};
pub use settings::{CompilerSettings, JavacOptions, LanguageLevel, ProjectSettings};
pub use url::{is_archive, root_url};
