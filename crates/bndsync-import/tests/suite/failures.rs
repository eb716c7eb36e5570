use std::path::PathBuf;
use std::sync::Arc;

use bndsync_import::{
    CancellationToken, CollectingSink, Execution, ImportError, ImportPipeline, ImportState,
    Importer, Reporter, Severity,
};
use bndsync_model::{Dependency, ExternalWorkspace, ModelError, ProjectUnit};

use super::{import, importer, Fixture};

#[test]
fn a_failing_unit_aborts_the_cycle_without_mutation() {
    let fx = Fixture::new();
    let a = fx.project("A");
    let mut b = fx.project("B");
    b.prepare_error = Some("bnd.bnd has errors".to_string());

    let workspace = fx.workspace(vec![a, b]);
    let mut host = fx.host();
    let err = import(&workspace, &mut host, Reporter::Strict).unwrap_err();

    assert!(
        matches!(&err, ImportError::UnitPreparation { unit, message } if unit == "B" && message == "bnd.bnd has errors"),
        "{err}"
    );
    assert_eq!(host.commit_count(), 0);
    assert!(host.modules().is_empty());
}

#[test]
fn preparation_failures_are_notified_separately() {
    let fx = Fixture::new();
    let mut a = fx.project("A");
    a.warnings = vec!["deprecated instruction".to_string()];
    let mut b = fx.project("B");
    b.prepare_error = Some("bnd.bnd has errors".to_string());

    let workspace = fx.workspace(vec![a, b]);
    let mut host = fx.host();
    let sink = Arc::new(CollectingSink::new());
    let err = import(&workspace, &mut host, Reporter::notify(sink.clone())).unwrap_err();

    assert!(matches!(err, ImportError::UnitPreparation { .. }));
    let notifications = sink.take();
    assert_eq!(notifications.len(), 2);
    assert_eq!(notifications[0].severity, Severity::Error);
    assert_eq!(
        notifications[0].text(),
        "Cannot resolve project 'B': bnd.bnd has errors"
    );
    // What was collected before the failure is still shown, once.
    assert_eq!(notifications[1].severity, Severity::Warning);
    assert_eq!(notifications[1].text(), "A: deprecated instruction");
    assert_eq!(host.commit_count(), 0);
}

#[test]
fn missing_project_directories_fail_preparation() {
    let fx = Fixture::new();
    // No directory is created for this unit.
    let ghost = bndsync_model::SnapshotProject::new("ghost");

    let workspace = fx.workspace(vec![ghost]);
    let mut host = fx.host();
    let err = import(&workspace, &mut host, Reporter::Strict).unwrap_err();
    assert!(err.to_string().contains("does not exist"), "{err}");
}

#[test]
fn strict_mode_fails_on_unit_warnings_before_building() {
    let fx = Fixture::new();
    let mut a = fx.project("A");
    a.warnings = vec!["Unused -buildpath entry".to_string()];

    let workspace = fx.workspace(vec![a]);
    let mut host = fx.host();
    let err = import(&workspace, &mut host, Reporter::Strict).unwrap_err();

    assert!(
        matches!(&err, ImportError::Reported { messages } if messages == &["A: Unused -buildpath entry"]),
        "{err}"
    );
    assert_eq!(host.commit_count(), 0);
}

#[test]
fn strict_mode_fails_on_dependency_warnings_after_commit() {
    let fx = Fixture::new();
    let mut a = fx.project("A");
    a.buildpath = vec![Dependency::project(
        "ghost",
        "1.0",
        fx.path("ghost/generated/ghost.jar"),
    )];

    let workspace = fx.workspace(vec![a]);
    let mut host = fx.host();
    let err = import(&workspace, &mut host, Reporter::Strict).unwrap_err();

    assert!(matches!(err, ImportError::Reported { .. }), "{err}");
    assert_eq!(host.commit_count(), 1);
    assert!(host.module("A").is_some());
}

#[test]
fn a_cancelled_token_stops_before_the_first_unit() {
    let fx = Fixture::new();
    let workspace = fx.workspace(vec![fx.project("A")]);
    let mut host = fx.host();

    let token = CancellationToken::new();
    token.cancel();
    let handle = ImportPipeline::new(importer(workspace, Reporter::Strict))
        .cancellation(token)
        .run(Execution::Synchronous(&mut host));

    assert_eq!(handle.state(), ImportState::Failed);
    assert!(matches!(handle.wait(), Err(ImportError::Cancelled)));
    assert_eq!(host.commit_count(), 0);
}

/// Cancels the import while it is being prepared.
struct CancelOnPrepare {
    inner: Arc<dyn ProjectUnit>,
    token: CancellationToken,
}

impl ProjectUnit for CancelOnPrepare {
    fn name(&self) -> &str {
        self.inner.name()
    }
    fn base(&self) -> PathBuf {
        self.inner.base()
    }
    fn source_path(&self) -> Vec<PathBuf> {
        self.inner.source_path()
    }
    fn test_src(&self) -> Option<PathBuf> {
        self.inner.test_src()
    }
    fn src_output(&self) -> PathBuf {
        self.inner.src_output()
    }
    fn test_output(&self) -> PathBuf {
        self.inner.test_output()
    }
    fn target(&self) -> PathBuf {
        self.inner.target()
    }
    fn property(&self, key: &str) -> Option<String> {
        self.inner.property(key)
    }
    fn prepare(&self) -> Result<(), ModelError> {
        self.token.cancel();
        self.inner.prepare()
    }
    fn errors(&self) -> Vec<String> {
        self.inner.errors()
    }
    fn warnings(&self) -> Vec<String> {
        self.inner.warnings()
    }
    fn bootclasspath(&self) -> Result<Vec<Dependency>, ModelError> {
        self.inner.bootclasspath()
    }
    fn buildpath(&self) -> Result<Vec<Dependency>, ModelError> {
        self.inner.buildpath()
    }
    fn testpath(&self) -> Result<Vec<Dependency>, ModelError> {
        self.inner.testpath()
    }
    fn clear(&self) {
        self.inner.clear()
    }
    fn force_refresh(&self) -> Result<(), ModelError> {
        self.inner.force_refresh()
    }
}

#[test]
fn cancellation_between_units_builds_nothing() {
    let fx = Fixture::new();
    let workspace = fx.workspace(vec![fx.project("A"), fx.project("B")]);
    let mut units = workspace.projects().unwrap();
    let token = CancellationToken::new();
    units[0] = Arc::new(CancelOnPrepare {
        inner: Arc::clone(&units[0]),
        token: token.clone(),
    });

    let mut host = fx.host();
    let result = ImportPipeline::new(Importer::new(workspace, units, Reporter::Strict))
        .cancellation(token)
        .run(Execution::Synchronous(&mut host))
        .wait();

    assert!(matches!(result, Err(ImportError::Cancelled)));
    assert_eq!(host.commit_count(), 0);
    assert!(host.modules().is_empty());
}

#[test]
fn disposed_projects_are_left_alone() {
    let fx = Fixture::new();
    let workspace = fx.workspace(vec![fx.project("A")]);
    let mut host = fx.host();
    host.dispose();

    let summary = import(&workspace, &mut host, Reporter::Strict).unwrap();
    assert!(summary.modules.is_empty());
    assert_eq!(host.commit_count(), 0);
}

#[test]
fn unprepared_units_are_logged_and_skipped_while_wiring() {
    let fx = Fixture::new();
    let workspace = fx.workspace(vec![fx.project("A"), fx.project("B")]);
    let units = workspace.projects().unwrap();

    let resolved = Importer::new(workspace.clone(), units.clone(), Reporter::Strict)
        .resolve(&CancellationToken::new(), &Default::default())
        .unwrap();
    // A unit losing its prepared state between the phases cannot be wired,
    // but the others still are and everything is committed.
    units[0].clear();

    let mut host = fx.host();
    let summary = resolved.build_structure(&mut host, false).unwrap();
    assert_eq!(summary.modules, vec!["A", "B"]);
    assert_eq!(host.commit_count(), 1);
}
