use std::path::Path;

use bndsync_archive::SourceRootIndex;
use bndsync_host::{
    root_url, DependencyScope, HostModule, Library, OrderEntry, ProjectModification, RootKind,
    RootSet, Sdk,
};
use bndsync_model::Dependency;

use crate::classify::{unrepresentable, DependencyKind};
use crate::{DependencyWarning, BND_LIB_PREFIX};

/// Result of materializing one dependency.
///
/// A workspace-module dependency yields two entries: the module reference
/// (absent when the module is already referenced) and the library for the
/// unit's generated bundle, which may carry resources that are not part of the
/// module output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Materialized {
    Sdk { name: String },
    Entries {
        module: Option<OrderEntry>,
        library: OrderEntry,
    },
}

impl Materialized {
    /// Add the result to `module`'s order entries.
    pub fn attach(self, module: &mut HostModule) {
        match self {
            Materialized::Sdk { name } => module.set_sdk(name),
            Materialized::Entries {
                module: reference,
                library,
            } => {
                if let Some(reference) = reference {
                    module.add_entry(reference);
                }
                module.add_entry(library);
            }
        }
    }
}

/// Turns classified dependencies into host libraries, SDKs and module
/// references inside one [`ProjectModification`].
pub struct EntryMaterializer<'a> {
    workspace_base: &'a Path,
    host_project: &'a str,
    sources: &'a SourceRootIndex,
}

impl<'a> EntryMaterializer<'a> {
    pub fn new(
        workspace_base: &'a Path,
        host_project: &'a str,
        sources: &'a SourceRootIndex,
    ) -> Self {
        Self {
            workspace_base,
            host_project,
            sources,
        }
    }

    /// Materialize `dependency` for `consumer`. Shared libraries and SDKs are
    /// created in (or updated inside) `model`; the consumer itself is left
    /// untouched until the result is attached.
    pub fn materialize(
        &self,
        model: &mut ProjectModification,
        consumer: &HostModule,
        dependency: &Dependency,
        kind: DependencyKind,
        scope: DependencyScope,
    ) -> Result<Materialized, DependencyWarning> {
        match kind {
            DependencyKind::PlatformRuntime => self.sdk(model, dependency),
            DependencyKind::WorkspaceModule => {
                let name = dependency
                    .project
                    .as_deref()
                    .unwrap_or(dependency.bsn.as_str());
                if !model.modules.contains(name) {
                    return Err(DependencyWarning::UnknownModule {
                        name: name.to_string(),
                    });
                }
                let reference = (!consumer.has_module_dependency(name)).then(|| OrderEntry::Module {
                    module: name.to_string(),
                    scope,
                });
                let library = self.repository_library(model, dependency, scope)?;
                Ok(Materialized::Entries {
                    module: reference,
                    library,
                })
            }
            DependencyKind::RepositoryArtifact => Ok(Materialized::Entries {
                module: None,
                library: self.repository_library(model, dependency, scope)?,
            }),
            DependencyKind::ExternalFile => {
                let name = dependency
                    .file
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| dependency.bsn.clone());
                let mut library = Library::new(name);
                library.roots = self.roots(dependency)?;
                Ok(Materialized::Entries {
                    module: None,
                    library: OrderEntry::ModuleLibrary { library, scope },
                })
            }
        }
    }

    /// Name of the SDK created for a platform runtime dependency. Runtimes
    /// stored inside the workspace are qualified with the host project so two
    /// workspaces never share one.
    pub fn sdk_name(&self, dependency: &Dependency) -> String {
        let mut name = library_name(dependency);
        if dependency.file.starts_with(self.workspace_base)
            && dependency.file != self.workspace_base
        {
            name.push('-');
            name.push_str(self.host_project);
        }
        name
    }

    fn sdk(
        &self,
        model: &mut ProjectModification,
        dependency: &Dependency,
    ) -> Result<Materialized, DependencyWarning> {
        let name = self.sdk_name(dependency);
        if !model.sdks.contains(&name) {
            let roots = self.roots(dependency)?;
            let home = dependency.file.parent().unwrap_or(dependency.file.as_path());
            let mut sdk = Sdk::new(name.clone(), home, dependency.version.clone());
            sdk.roots = roots;
            model.sdks.insert(sdk);
        }
        Ok(Materialized::Sdk { name })
    }

    fn repository_library(
        &self,
        model: &mut ProjectModification,
        dependency: &Dependency,
        scope: DependencyScope,
    ) -> Result<OrderEntry, DependencyWarning> {
        let name = library_name(dependency);
        let roots = self.roots(dependency)?;
        let library = model
            .libraries
            .find_or_insert_with(&name, || Library::new(name.clone()));
        library.roots.clear(RootKind::Classes);
        library.roots.clear(RootKind::Sources);
        for url in roots.classes {
            library.roots.add(url, RootKind::Classes);
        }
        for url in roots.sources {
            library.roots.add(url, RootKind::Sources);
        }
        Ok(OrderEntry::Library {
            library: name,
            scope,
        })
    }

    fn roots(&self, dependency: &Dependency) -> Result<RootSet, DependencyWarning> {
        let url = root_url(&dependency.file).map_err(|_| unrepresentable(dependency))?;
        let mut roots = RootSet::default();
        if let Some(src_root) = self.sources.source_root(&dependency.file) {
            roots.add(format!("{url}{src_root}"), RootKind::Sources);
        }
        roots.add(url, RootKind::Classes);
        Ok(roots)
    }
}

/// `bnd:<bsn>:<version>`
pub fn library_name(dependency: &Dependency) -> String {
    format!("{BND_LIB_PREFIX}{}:{}", dependency.bsn, dependency.version)
}
