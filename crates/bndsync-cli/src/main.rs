use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use bndsync_config::{load_for_workspace, BndSyncConfig};
use bndsync_host::{HostProject, InMemoryProject};
use bndsync_import::{
    create_root_module, CollectingSink, Execution, ImportError, ImportSummary, Notification,
    Reporter, WorkspaceRegistry,
};
use bndsync_model::SnapshotLoader;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

#[derive(Parser)]
#[command(
    name = "bndsync",
    version,
    about = "Synchronize Bnd workspaces into an IDE project model"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import a Bnd workspace (or some of its projects) into the host model
    Import(ImportArgs),
}

#[derive(Args)]
struct ImportArgs {
    /// Workspace root (the directory containing `cnf`)
    workspace: PathBuf,

    /// Reimport only the project living in this directory (repeatable)
    #[arg(long = "project", value_name = "DIR")]
    projects: Vec<PathBuf>,

    /// Host model state file; loaded if present, written after the import
    #[arg(long, value_name = "FILE")]
    state: Option<PathBuf>,

    /// Fail on any reported problem instead of collecting notifications
    #[arg(long)]
    headless: bool,

    /// Config file (defaults to `<workspace>/bndsync.toml`)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            2
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Import(args) => import(args),
    }
}

fn import(args: ImportArgs) -> Result<i32> {
    let root = std::fs::canonicalize(&args.workspace)
        .with_context(|| format!("failed to resolve workspace {}", args.workspace.display()))?;

    let config = match &args.config {
        Some(path) => BndSyncConfig::load_from_path(path)?,
        None => load_for_workspace(&root)?.0,
    };
    bndsync_config::init_tracing(&config.logging);

    let headless = args.headless || config.import.headless;
    tracing::info!(
        target = "bndsync.cli",
        workspace = %root.display(),
        headless,
        projects = args.projects.len(),
        "starting import"
    );

    let mut project = open_host(&root, args.state.as_deref())?;

    let registry = WorkspaceRegistry::new(Arc::new(SnapshotLoader))
        .with_repository_refresh(config.import.refresh_repositories);
    if registry.find_workspace(&project).is_none() {
        bail!("{} is not a Bnd workspace", root.display());
    }

    let sink = Arc::new(CollectingSink::new());
    let reporter = if headless {
        Reporter::Strict
    } else {
        Reporter::Notify {
            group: config.import.notification_group.clone(),
            sink: sink.clone(),
        }
    };

    let id = project.id();
    let pipeline = if args.projects.is_empty() {
        registry.reimport_workspace(&id, reporter)?
    } else {
        let dirs = args
            .projects
            .iter()
            .map(|dir| if dir.is_absolute() { dir.clone() } else { root.join(dir) })
            .collect::<Vec<_>>();
        registry.reimport_projects(&id, &dirs, reporter)?
    };

    let outcome = pipeline.run(Execution::Synchronous(&mut project)).wait();

    if let Some(state) = &args.state {
        project
            .save(state)
            .with_context(|| format!("failed to write state {}", state.display()))?;
    }

    let report = ImportReport::new(&root, &project, &outcome, sink.take());
    print_report(&report, args.json)?;
    Ok(if report.ok { 0 } else { 1 })
}

/// Loads the host model from `state`, or creates a fresh one with a root
/// module for the workspace.
fn open_host(root: &Path, state: Option<&Path>) -> Result<InMemoryProject> {
    if let Some(state) = state.filter(|state| state.is_file()) {
        let project = InMemoryProject::load(state)
            .with_context(|| format!("failed to load state {}", state.display()))?;
        if project.base_path() != Some(root) {
            bail!(
                "state {} belongs to {}",
                state.display(),
                project
                    .base_path()
                    .map(|base| base.display().to_string())
                    .unwrap_or_default()
            );
        }
        return Ok(project);
    }

    let name = root
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "workspace".to_string());
    let mut project = InMemoryProject::new(name, root);
    let mut model = project.modifiable_model();
    create_root_module(&mut model, &project)?;
    project.commit(model)?;
    Ok(project)
}

#[derive(Debug, Serialize)]
struct ImportReport {
    workspace: PathBuf,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    /// Modules rebuilt by this run.
    imported: Vec<String>,
    modules: Vec<String>,
    libraries: Vec<String>,
    sdks: Vec<String>,
    notifications: Vec<NotificationOutput>,
}

#[derive(Debug, Serialize)]
struct NotificationOutput {
    group: String,
    title: String,
    severity: String,
    lines: Vec<String>,
}

impl From<Notification> for NotificationOutput {
    fn from(notification: Notification) -> Self {
        Self {
            group: notification.group,
            title: notification.title,
            severity: notification.severity.to_string(),
            lines: notification.lines,
        }
    }
}

impl ImportReport {
    fn new(
        root: &Path,
        project: &InMemoryProject,
        outcome: &Result<ImportSummary, ImportError>,
        notifications: Vec<Notification>,
    ) -> Self {
        let (imported, error) = match outcome {
            Ok(summary) => (summary.modules.clone(), None),
            Err(err) => (Vec::new(), Some(err.to_string())),
        };
        Self {
            workspace: root.to_path_buf(),
            ok: error.is_none(),
            error,
            imported,
            modules: project.modules().keys().map(str::to_string).collect(),
            libraries: project.libraries().keys().map(str::to_string).collect(),
            sdks: project.sdks().keys().map(str::to_string).collect(),
            notifications: notifications.into_iter().map(Into::into).collect(),
        }
    }
}

fn print_report(report: &ImportReport, json: bool) -> Result<()> {
    if json {
        let out = serde_json::to_string_pretty(report)?;
        println!("{out}");
        return Ok(());
    }

    println!("workspace: {}", report.workspace.display());
    if let Some(error) = &report.error {
        println!("import failed: {error}");
    } else {
        println!("imported: {}", report.imported.join(", "));
    }
    println!("  modules: {}", report.modules.len());
    println!("  libraries: {}", report.libraries.len());
    println!("  sdks: {}", report.sdks.len());
    for notification in &report.notifications {
        println!("{}: {}", notification.severity, notification.title);
        for line in &notification.lines {
            println!("  {line}");
        }
    }
    Ok(())
}
