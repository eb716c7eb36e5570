use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

use crate::suite::{bndsync, workspace};

fn run_json(cmd: &mut assert_cmd::Command) -> (bool, serde_json::Value) {
    let output = cmd.arg("--json").output().unwrap();
    let v: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap_or_else(|err| {
        panic!(
            "invalid json ({err}); stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        )
    });
    (output.status.success(), v)
}

fn names(v: &serde_json::Value, key: &str) -> Vec<String> {
    v[key]
        .as_array()
        .unwrap()
        .iter()
        .map(|name| name.as_str().unwrap().to_string())
        .collect()
}

#[test]
fn help_mentions_import() {
    bndsync()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("import"));
}

#[test]
fn imports_whole_workspace() {
    let temp = workspace(&[]);

    let (ok, v) = run_json(bndsync().arg("import").arg(temp.child("ws").path()));

    assert!(ok, "{v:#}");
    assert_eq!(v["ok"], true);
    assert_eq!(names(&v, "imported"), vec!["app", "lib"]);
    let modules = names(&v, "modules");
    assert!(modules.contains(&"ws".to_string()));
    assert!(modules.contains(&"app".to_string()));
    assert_eq!(names(&v, "libraries"), vec!["bnd:libX:1.0", "bnd:lib:0.0.0"]);
    assert!(v["notifications"].as_array().unwrap().is_empty());
}

#[test]
fn unit_warnings_become_one_notification() {
    let temp = workspace(&["missing export", "unused import"]);

    let (ok, v) = run_json(bndsync().arg("import").arg(temp.child("ws").path()));

    assert!(ok, "{v:#}");
    let notifications = v["notifications"].as_array().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["severity"], "warning");
    assert_eq!(notifications[0]["group"], "OSGi Bnd Notifications");
    assert_eq!(
        notifications[0]["lines"],
        serde_json::json!(["app: missing export", "app: unused import"])
    );
}

#[test]
fn headless_import_fails_on_warnings() {
    let temp = workspace(&["missing export"]);

    let (ok, v) = run_json(
        bndsync()
            .arg("import")
            .arg(temp.child("ws").path())
            .arg("--headless"),
    );

    assert!(!ok);
    assert_eq!(v["ok"], false);
    assert!(v["error"].as_str().unwrap().contains("missing export"));
    assert!(v["imported"].as_array().unwrap().is_empty());
}

#[test]
fn headless_can_come_from_config() {
    let temp = workspace(&["missing export"]);
    temp.child("ws/bndsync.toml")
        .write_str("[import]\nheadless = true\n\n[logging]\nstderr = false\n")
        .unwrap();

    bndsync()
        .arg("import")
        .arg(temp.child("ws").path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("import failed"));
}

#[test]
fn state_is_persisted_and_reused() {
    let temp = workspace(&[]);
    let state = temp.child("state/project.json");

    let (ok, _) = run_json(
        bndsync()
            .arg("import")
            .arg(temp.child("ws").path())
            .arg("--state")
            .arg(state.path()),
    );
    assert!(ok);
    state.assert(predicate::path::is_file());

    let (ok, v) = run_json(
        bndsync()
            .arg("import")
            .arg(temp.child("ws").path())
            .arg("--project")
            .arg("lib")
            .arg("--state")
            .arg(state.path()),
    );
    assert!(ok, "{v:#}");
    assert_eq!(names(&v, "imported"), vec!["lib"]);
    // Modules from the first run survive in the loaded state.
    assert!(names(&v, "modules").contains(&"app".to_string()));
    assert_eq!(names(&v, "libraries"), vec!["bnd:libX:1.0", "bnd:lib:0.0.0"]);
}

#[test]
fn rejects_directories_without_cnf() {
    let temp = TempDir::new().unwrap();

    bndsync()
        .arg("import")
        .arg(temp.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("is not a Bnd workspace"));
}

#[test]
fn malformed_config_is_reported() {
    let temp = workspace(&[]);
    temp.child("ws/bndsync.toml")
        .write_str("[import]\nheadles = true\n")
        .unwrap();

    bndsync()
        .arg("import")
        .arg(temp.child("ws").path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to parse config file"));
}
