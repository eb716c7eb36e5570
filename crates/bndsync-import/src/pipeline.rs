use std::collections::HashSet;
use std::sync::Arc;

use bndsync_archive::SourceRootIndex;
use bndsync_host::{
    DependencyScope, HostModule, HostProject, JavacOptions, LanguageLevel, ProjectModification,
};
use bndsync_model::{ContainerType, Dependency, ExternalWorkspace, ProjectUnit};
use tokio_util::sync::CancellationToken;

use crate::classify::{classify, Action};
use crate::materialize::EntryMaterializer;
use crate::module_builder::build_module;
use crate::progress::ProgressSender;
use crate::reorder::reorder;
use crate::report::{CycleReport, Reporter, Severity};
use crate::{DependencyWarning, ImportError, JAVAC_SOURCE, JAVAC_TARGET};

/// Phase of one import cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportState {
    Idle,
    Resolving,
    Failed,
    Resolved,
    BuildingStructure,
    Done,
}

impl ImportState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ImportState::Failed | ImportState::Done)
    }
}

/// What a finished cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    /// Modules (re)built, in unit order. Empty when the host project was
    /// disposed before the structure could be built.
    pub modules: Vec<String>,
    pub problems: Vec<String>,
    pub severity: Option<Severity>,
}

impl ImportSummary {
    fn skipped() -> Self {
        Self {
            modules: Vec::new(),
            problems: Vec::new(),
            severity: None,
        }
    }
}

/// Imports a set of units of one Bnd workspace into a host project.
///
/// An importer owns its [`SourceRootIndex`], so archives are probed at most
/// once per importer.
pub struct Importer {
    workspace: Arc<dyn ExternalWorkspace>,
    units: Vec<Arc<dyn ProjectUnit>>,
    sources: SourceRootIndex,
    reporter: Reporter,
}

impl Importer {
    pub fn new(
        workspace: Arc<dyn ExternalWorkspace>,
        units: Vec<Arc<dyn ProjectUnit>>,
        reporter: Reporter,
    ) -> Self {
        Self {
            workspace,
            units,
            sources: SourceRootIndex::new(),
            reporter,
        }
    }

    pub fn workspace(&self) -> &Arc<dyn ExternalWorkspace> {
        &self.workspace
    }

    pub fn units(&self) -> &[Arc<dyn ProjectUnit>] {
        &self.units
    }

    /// Apply workspace-wide compiler settings to `project`.
    pub fn setup_project(&self, project: &mut dyn HostProject) {
        setup_project(&*self.workspace, project);
    }

    /// Prepare every unit and probe its archives for embedded sources.
    ///
    /// Does not touch the host model. Cancellation is checked before each
    /// unit; the first unit that fails to prepare aborts the cycle.
    pub fn resolve(
        mut self,
        token: &CancellationToken,
        progress: &ProgressSender,
    ) -> Result<ResolvedImport, ImportError> {
        let progress = progress.start("Resolving Bnd projects");
        let mut report = CycleReport::default();
        let total = self.units.len();

        for (done, unit) in self.units.iter().enumerate() {
            if token.is_cancelled() {
                progress.finish(Some("cancelled".to_string()));
                return Err(ImportError::Cancelled);
            }

            let name = unit.name();
            let base = unit.base();
            tracing::info!(
                target = "bndsync.import",
                unit = %name,
                base = %base.display(),
                "resolving"
            );
            progress.report(Some(name.to_string()), None);

            if let Err(err) = unit.prepare() {
                progress.finish(Some("failed".to_string()));
                let err = self.reporter.preparation_failed(name, err.to_string());
                self.reporter.finish(&report)?;
                return Err(err);
            }

            report.unit_messages(name, &unit.errors(), true);
            report.unit_messages(name, &unit.warnings(), false);
            self.reporter.check(&report)?;

            probe_sources(&mut self.sources, &**unit);

            progress.fraction(done + 1, total);
        }

        progress.finish(None);
        Ok(ResolvedImport {
            workspace: self.workspace,
            units: self.units,
            sources: self.sources,
            reporter: self.reporter,
            report,
        })
    }
}

fn probe_sources(sources: &mut SourceRootIndex, unit: &dyn ProjectUnit) {
    let classpaths = [unit.bootclasspath(), unit.buildpath(), unit.testpath()];
    for classpath in classpaths {
        let Ok(classpath) = classpath else {
            continue;
        };
        for dependency in classpath {
            if matches!(
                dependency.container_type,
                ContainerType::Repo | ContainerType::External
            ) {
                sources.probe(&dependency.file);
            }
        }
    }
}

/// Copy the workspace's `javac.*` settings into the host project settings.
pub fn setup_project(workspace: &dyn ExternalWorkspace, project: &mut dyn HostProject) {
    let settings = project.settings_mut();

    if let Some(level) = workspace
        .property(JAVAC_SOURCE)
        .and_then(|value| LanguageLevel::parse(&value))
    {
        settings.language_level = Some(level);
    }

    settings.compiler.bytecode_target = workspace.property(JAVAC_TARGET);

    settings.compiler.javac = JavacOptions {
        debugging_info: boolean_property(&workspace.property_or("javac.debug", "true")),
        deprecation: boolean_property(&workspace.property_or("java.deprecation", "")),
        additional_options: workspace.property_or("java.options", ""),
    };
}

fn boolean_property(value: &str) -> bool {
    value.eq_ignore_ascii_case("on") || value.eq_ignore_ascii_case("true")
}

/// Outcome of a successful resolve, ready to be applied on the model thread.
pub struct ResolvedImport {
    workspace: Arc<dyn ExternalWorkspace>,
    units: Vec<Arc<dyn ProjectUnit>>,
    sources: SourceRootIndex,
    reporter: Reporter,
    report: CycleReport,
}

impl ResolvedImport {
    pub fn sources(&self) -> &SourceRootIndex {
        &self.sources
    }

    /// Build module skeletons, wire their dependencies and commit everything
    /// at once.
    ///
    /// Failures of a single unit are logged and the remaining units are still
    /// processed. When `refresh` is set the host rescans its files afterwards.
    pub fn build_structure(
        mut self,
        project: &mut dyn HostProject,
        refresh: bool,
    ) -> Result<ImportSummary, ImportError> {
        if project.is_disposed() {
            tracing::debug!(
                target = "bndsync.import",
                project = project.name(),
                "project disposed; skipping import"
            );
            return Ok(ImportSummary::skipped());
        }

        let project_level = project.settings().language_level;
        let mut model = project.modifiable_model();

        let mut modules: Vec<(Arc<dyn ProjectUnit>, HostModule)> =
            Vec::with_capacity(self.units.len());
        for unit in &self.units {
            match build_module(&mut model, &**unit, project_level) {
                Ok(module) => modules.push((Arc::clone(unit), module)),
                Err(err) => {
                    tracing::error!(
                        target = "bndsync.import",
                        unit = %unit.name(),
                        error = %err,
                        "failed to build module"
                    );
                }
            }
        }

        let materializer =
            EntryMaterializer::new(self.workspace.base(), project.name(), &self.sources);
        for (unit, module) in modules.iter_mut() {
            match wire_dependencies(&materializer, &mut model, module, &**unit) {
                Ok(warnings) => self.report.dependency_warnings(unit.name(), &warnings),
                Err(err) => {
                    tracing::error!(
                        target = "bndsync.import",
                        unit = %unit.name(),
                        error = %err,
                        "failed to set dependencies"
                    );
                }
            }
        }

        let names = modules
            .iter()
            .map(|(_, module)| module.name.clone())
            .collect::<Vec<_>>();
        for (_, module) in modules {
            model.modules.insert(module);
        }
        commit(project, model)?;

        if refresh {
            project.refresh_files();
        }

        self.reporter.finish(&self.report)?;
        Ok(ImportSummary {
            modules: names,
            problems: self.report.lines().to_vec(),
            severity: self.report.severity(),
        })
    }
}

fn commit(project: &mut dyn HostProject, model: ProjectModification) -> Result<(), ImportError> {
    project.commit(model).map_err(|err| {
        tracing::error!(
            target = "bndsync.import",
            project = project.name(),
            error = %err,
            "commit rejected"
        );
        ImportError::Host(err)
    })
}

/// Add the order entries of `unit`'s boot, build and test paths to `module`.
fn wire_dependencies(
    materializer: &EntryMaterializer<'_>,
    model: &mut ProjectModification,
    module: &mut HostModule,
    unit: &dyn ProjectUnit,
) -> Result<Vec<DependencyWarning>, ImportError> {
    let mut warnings = Vec::new();

    let boot = unit.bootclasspath()?;
    let mut excluded = HashSet::new();
    if !boot.is_empty() {
        add_classpath(
            materializer,
            model,
            module,
            unit.name(),
            &boot,
            DependencyScope::Compile,
            &excluded,
            &mut warnings,
        );
        excluded = boot.into_iter().collect();
        reorder(module);
    }

    add_classpath(
        materializer,
        model,
        module,
        unit.name(),
        &unit.buildpath()?,
        DependencyScope::Compile,
        &excluded,
        &mut warnings,
    );
    add_classpath(
        materializer,
        model,
        module,
        unit.name(),
        &unit.testpath()?,
        DependencyScope::Test,
        &excluded,
        &mut warnings,
    );

    Ok(warnings)
}

#[allow(clippy::too_many_arguments)]
fn add_classpath(
    materializer: &EntryMaterializer<'_>,
    model: &mut ProjectModification,
    module: &mut HostModule,
    unit: &str,
    classpath: &[Dependency],
    scope: DependencyScope,
    excluded: &HashSet<Dependency>,
    warnings: &mut Vec<DependencyWarning>,
) {
    for dependency in classpath {
        let kind = match classify(dependency, excluded, unit) {
            Ok(Action::Skip(_)) => continue,
            Ok(Action::Materialize(kind)) => kind,
            Err(warning) => {
                warnings.push(warning);
                continue;
            }
        };
        match materializer.materialize(model, module, dependency, kind, scope) {
            Ok(entries) => entries.attach(module),
            Err(warning) => warnings.push(warning),
        }
    }
}
