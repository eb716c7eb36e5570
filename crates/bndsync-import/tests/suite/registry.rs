use std::path::Path;
use std::sync::Arc;

use bndsync_host::{DependencyScope, HostProject, OrderEntry};
use bndsync_import::{Execution, ImportError, Reporter, WorkspaceRegistry};
use bndsync_model::{
    Dependency, ExternalWorkspace, ModelError, SnapshotLoader, SnapshotRepository,
    SnapshotWorkspace, WorkspaceLoader,
};
use parking_lot::Mutex;

use super::Fixture;

/// Opens snapshot workspaces and keeps the last one for inspection.
#[derive(Default)]
struct KeepingLoader {
    last: Mutex<Option<Arc<SnapshotWorkspace>>>,
}

impl WorkspaceLoader for KeepingLoader {
    fn open(&self, base: &Path) -> Result<Arc<dyn ExternalWorkspace>, ModelError> {
        let workspace = Arc::new(SnapshotWorkspace::open(base)?);
        *self.last.lock() = Some(Arc::clone(&workspace));
        Ok(workspace)
    }
}

fn repositories() -> Vec<SnapshotRepository> {
    vec![
        SnapshotRepository {
            name: "Local".to_string(),
            refreshable: true,
            refresh_error: None,
        },
        SnapshotRepository {
            name: "Central".to_string(),
            refreshable: true,
            refresh_error: Some("connection refused".to_string()),
        },
        SnapshotRepository {
            name: "Release".to_string(),
            refreshable: false,
            refresh_error: None,
        },
    ]
}

#[test]
fn finds_workspaces_with_a_cnf_directory() {
    let fx = Fixture::new();
    fx.write_snapshot(&fx.snapshot(vec![fx.project("A")]));
    let registry = WorkspaceRegistry::new(Arc::new(SnapshotLoader));
    let host = fx.host();

    assert!(registry.workspace(&host).is_none());
    let workspace = registry.find_workspace(&host).unwrap();
    assert_eq!(workspace.base(), fx.base.as_path());
    assert!(registry.workspace(&host).is_some());

    assert!(registry.forget(&host.id()).is_some());
    assert!(registry.workspace(&host).is_none());
}

#[test]
fn plain_directories_and_broken_workspaces_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let registry = WorkspaceRegistry::new(Arc::new(SnapshotLoader));

    let plain = bndsync_host::InMemoryProject::new("plain", dir.path());
    assert!(registry.find_workspace(&plain).is_none());

    // A cnf directory without a snapshot cannot be opened.
    std::fs::create_dir_all(dir.path().join("cnf")).unwrap();
    assert!(registry.find_workspace(&plain).is_none());
    assert!(registry.workspace(&plain).is_none());
}

#[test]
fn reimporting_requires_a_known_workspace() {
    let fx = Fixture::new();
    let registry = WorkspaceRegistry::new(Arc::new(SnapshotLoader));
    let err = registry
        .reimport_workspace(&fx.host().id(), Reporter::Strict)
        .err()
        .unwrap();
    assert!(matches!(err, ImportError::NoWorkspace { .. }));
}

#[test]
fn workspace_reimport_reloads_refreshes_and_sets_up() {
    let fx = Fixture::new();
    let mut file = fx.snapshot(vec![fx.project("A"), fx.project("B")]);
    file.repositories = repositories();
    file.properties
        .insert("javac.source".to_string(), "11".to_string());
    fx.write_snapshot(&file);

    let loader = Arc::new(KeepingLoader::default());
    let registry = WorkspaceRegistry::new(loader.clone());
    let mut host = fx.host();
    registry.find_workspace(&host).unwrap();

    // Changes on disk after opening are picked up by the reimport.
    file.projects[0].buildpath = vec![Dependency::repo(
        "libX",
        "1.0",
        fx.path("cnf/cache/libX-1.0.jar"),
    )];
    fx.write_snapshot(&file);

    let summary = registry
        .reimport_workspace(&host.id(), Reporter::Strict)
        .unwrap()
        .run(Execution::Synchronous(&mut host))
        .wait()
        .unwrap();

    assert_eq!(summary.modules, vec!["A", "B"]);
    assert_eq!(
        host.settings().language_level,
        bndsync_host::LanguageLevel::parse("11")
    );
    assert_eq!(host.file_refresh_count(), 1);
    assert!(host.module("A").unwrap().order_entries.contains(&OrderEntry::Library {
        library: "bnd:libX:1.0".to_string(),
        scope: DependencyScope::Compile,
    }));

    let workspace = loader.last.lock().clone().unwrap();
    assert_eq!(workspace.refresh_count("Local"), 1);
    assert_eq!(workspace.refresh_count("Central"), 1);
    assert_eq!(workspace.refresh_count("Release"), 0);
}

#[test]
fn repository_refresh_can_be_disabled() {
    let fx = Fixture::new();
    let mut file = fx.snapshot(vec![fx.project("A")]);
    file.repositories = repositories();
    fx.write_snapshot(&file);

    let loader = Arc::new(KeepingLoader::default());
    let registry = WorkspaceRegistry::new(loader.clone()).with_repository_refresh(false);
    let mut host = fx.host();
    registry.find_workspace(&host).unwrap();
    registry
        .reimport_workspace(&host.id(), Reporter::Strict)
        .unwrap()
        .run(Execution::Synchronous(&mut host))
        .wait()
        .unwrap();

    let workspace = loader.last.lock().clone().unwrap();
    assert_eq!(workspace.refresh_count("Local"), 0);
}

#[test]
fn project_reimport_selects_units_by_directory_name() {
    let fx = Fixture::new();
    let mut file = fx.snapshot(vec![fx.project("A"), fx.project("B")]);
    fx.write_snapshot(&file);

    let registry = WorkspaceRegistry::new(Arc::new(SnapshotLoader));
    let mut host = fx.host();
    registry.find_workspace(&host).unwrap();
    registry
        .reimport_workspace(&host.id(), Reporter::Strict)
        .unwrap()
        .run(Execution::Synchronous(&mut host))
        .wait()
        .unwrap();

    file.projects[1].testpath = vec![Dependency::repo(
        "libY",
        "2.0",
        fx.path("cnf/cache/libY-2.0.jar"),
    )];
    fx.write_snapshot(&file);

    let summary = registry
        .reimport_projects(
            &host.id(),
            &[fx.path("B"), fx.path("unknown")],
            Reporter::Strict,
        )
        .unwrap()
        .run(Execution::Synchronous(&mut host))
        .wait()
        .unwrap();

    assert_eq!(summary.modules, vec!["B"]);
    assert!(host.module("A").is_some());
    assert_eq!(
        host.module("B").unwrap().order_entries.last(),
        Some(&OrderEntry::Library {
            library: "bnd:libY:2.0".to_string(),
            scope: DependencyScope::Test,
        })
    );
    assert_eq!(host.commit_count(), 2);
}
