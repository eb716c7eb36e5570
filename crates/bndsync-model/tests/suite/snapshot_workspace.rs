use std::fs;
use std::path::Path;

use bndsync_model::{
    ContainerType, Dependency, ExternalWorkspace, ModelError, SnapshotLoader, SnapshotProject,
    SnapshotRepository, SnapshotWorkspace, WorkspaceLoader, WorkspaceSnapshotFile,
    WORKSPACE_SNAPSHOT_REL_PATH,
};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn write_snapshot(base: &Path, file: &WorkspaceSnapshotFile) {
    let path = base.join(WORKSPACE_SNAPSHOT_REL_PATH);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_vec_pretty(file).unwrap()).unwrap();
}

#[test]
fn opens_snapshot_from_disk() {
    let tmp = tempdir().unwrap();
    fs::create_dir_all(tmp.path().join("app")).unwrap();
    let json = r#"{
  "schemaVersion": 1,
  "properties": { "javac.source": "1.8" },
  "projects": [
    {
      "name": "app",
      "testSrc": null,
      "properties": { "javac.source": "11" },
      "buildpath": [
        { "file": "cnf/cache/libX-1.0.jar", "bsn": "libX", "version": "1.0", "type": "repo" },
        { "file": "lib/generated/lib.jar", "bsn": "lib", "version": "0.0.0", "type": "project", "project": "lib" }
      ]
    }
  ]
}"#;
    let path = tmp.path().join(WORKSPACE_SNAPSHOT_REL_PATH);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, json).unwrap();

    let workspace = SnapshotLoader.open(tmp.path()).expect("open workspace");
    assert_eq!(workspace.property("javac.source").as_deref(), Some("1.8"));

    let app = workspace.project("app").expect("app unit");
    assert_eq!(app.property("javac.source").as_deref(), Some("11"));
    assert_eq!(app.test_src(), None);

    app.prepare().expect("prepare app");
    let buildpath = app.buildpath().unwrap();
    assert_eq!(buildpath.len(), 2);
    assert_eq!(buildpath[0].file, tmp.path().join("cnf/cache/libX-1.0.jar"));
    assert_eq!(buildpath[1].container_type, ContainerType::Project);
    assert_eq!(buildpath[1].project.as_deref(), Some("lib"));
}

#[test]
fn rejects_unknown_schema_versions() {
    let tmp = tempdir().unwrap();
    let file = WorkspaceSnapshotFile {
        schema_version: 99,
        ..WorkspaceSnapshotFile::default()
    };
    write_snapshot(tmp.path(), &file);

    let err = SnapshotWorkspace::open(tmp.path())
        .err()
        .expect("schema mismatch");
    assert!(matches!(
        err,
        ModelError::UnsupportedSchema {
            found: 99,
            expected: 1,
            ..
        }
    ));
}

#[test]
fn workspace_properties_fall_back_to_build_bnd() {
    let tmp = tempdir().unwrap();
    fs::create_dir_all(tmp.path().join("cnf")).unwrap();
    fs::write(
        tmp.path().join("cnf/build.bnd"),
        "javac.source: 1.8\njavac.target: 1.8\njava.options = -parameters\n",
    )
    .unwrap();
    let mut file = WorkspaceSnapshotFile::default();
    file.properties
        .insert("javac.target".to_string(), "11".to_string());
    write_snapshot(tmp.path(), &file);

    let workspace = SnapshotWorkspace::open(tmp.path()).unwrap();
    assert_eq!(workspace.property("javac.source").as_deref(), Some("1.8"));
    assert_eq!(workspace.property("javac.target").as_deref(), Some("11"));
    assert_eq!(
        workspace.property_or("java.options", ""),
        "-parameters".to_string()
    );
    assert_eq!(workspace.property_or("javac.debug", "true"), "true");
}

#[test]
fn force_refresh_picks_up_snapshot_changes() {
    let tmp = tempdir().unwrap();
    fs::create_dir_all(tmp.path().join("app")).unwrap();
    let mut file = WorkspaceSnapshotFile {
        projects: vec![SnapshotProject::new("app")],
        ..WorkspaceSnapshotFile::default()
    };
    write_snapshot(tmp.path(), &file);

    let workspace = SnapshotWorkspace::open(tmp.path()).unwrap();
    let app = workspace.project("app").unwrap();
    app.prepare().unwrap();
    assert!(app.buildpath().unwrap().is_empty());

    file.projects[0]
        .buildpath
        .push(Dependency::repo("libX", "1.0", "repo/libX.jar"));
    file.projects.push(SnapshotProject::new("other"));
    write_snapshot(tmp.path(), &file);

    workspace.force_refresh().unwrap();
    let names: Vec<_> = workspace
        .projects()
        .unwrap()
        .iter()
        .map(|unit| unit.name().to_string())
        .collect();
    assert_eq!(names, vec!["app".to_string(), "other".to_string()]);

    // Units survive a refresh, but lose their prepared state.
    assert!(app.buildpath().is_err());
    app.prepare().unwrap();
    assert_eq!(app.buildpath().unwrap().len(), 1);
}

#[test]
fn unit_force_refresh_reports_removed_projects() {
    let tmp = tempdir().unwrap();
    let file = WorkspaceSnapshotFile {
        projects: vec![SnapshotProject::new("app")],
        ..WorkspaceSnapshotFile::default()
    };
    write_snapshot(tmp.path(), &file);
    let workspace = SnapshotWorkspace::open(tmp.path()).unwrap();
    let app = workspace.project("app").unwrap();

    write_snapshot(tmp.path(), &WorkspaceSnapshotFile::default());
    let err = app.force_refresh().unwrap_err();
    assert!(matches!(err, ModelError::UnknownProject { ref name } if name == "app"));
}

#[test]
fn refreshable_repositories_count_refreshes() {
    let tmp = tempdir().unwrap();
    let file = WorkspaceSnapshotFile {
        repositories: vec![
            SnapshotRepository {
                name: "Local".to_string(),
                refreshable: true,
                refresh_error: None,
            },
            SnapshotRepository {
                name: "Release".to_string(),
                refreshable: false,
                refresh_error: None,
            },
            SnapshotRepository {
                name: "Central".to_string(),
                refreshable: true,
                refresh_error: Some("connection refused".to_string()),
            },
        ],
        ..WorkspaceSnapshotFile::default()
    };
    let workspace = SnapshotWorkspace::from_snapshot(tmp.path(), file);

    let repositories = workspace.repositories();
    assert!(repositories[1].as_refreshable().is_none());
    repositories[0].as_refreshable().unwrap().refresh().unwrap();
    let err = repositories[2].as_refreshable().unwrap().refresh().unwrap_err();
    assert_eq!(err.to_string(), "connection refused");

    assert_eq!(workspace.refresh_count("Local"), 1);
    assert_eq!(workspace.refresh_count("Central"), 1);
    assert_eq!(workspace.refresh_count("Release"), 0);
}
