use bndsync_host::{
    DependencyScope, HostError, HostModule, HostProject, InMemoryProject, Library, OrderEntry,
    RootKind, Sdk,
};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn module_with(entry: OrderEntry) -> HostModule {
    let mut module = HostModule::new("app", "/ws/app/app.iml");
    module.add_entry(entry);
    module
}

#[test]
fn commit_applies_all_tables() {
    let mut project = InMemoryProject::new("ws", "/ws");
    let mut model = project.modifiable_model();

    let mut library = Library::new("bnd:libX:1.0");
    library
        .roots
        .add("jar:file:///ws/libX.jar!/", RootKind::Classes);
    model.libraries.insert(library);
    model.sdks.insert(Sdk::new("bnd:ee.j2se:1.8", "/ws/cnf", "1.8"));
    let mut module = module_with(OrderEntry::Library {
        library: "bnd:libX:1.0".to_string(),
        scope: DependencyScope::Compile,
    });
    module.set_sdk("bnd:ee.j2se:1.8");
    model.modules.insert(module);
    model
        .compiler
        .set_module_bytecode_target("app", Some("1.8".to_string()));

    project.commit(model).expect("commit");

    assert_eq!(project.commit_count(), 1);
    assert_eq!(project.modules().len(), 1);
    assert!(project.library("bnd:libX:1.0").is_some());
    assert!(project.sdk("bnd:ee.j2se:1.8").is_some());
    assert_eq!(
        project
            .settings()
            .compiler
            .module_bytecode_targets
            .get("app")
            .map(String::as_str),
        Some("1.8")
    );
}

#[test]
fn dangling_references_reject_the_whole_commit() {
    let mut project = InMemoryProject::new("ws", "/ws");
    let mut model = project.modifiable_model();
    model.libraries.insert(Library::new("bnd:libY:2.0"));
    model.modules.insert(module_with(OrderEntry::Module {
        module: "missing".to_string(),
        scope: DependencyScope::Compile,
    }));

    let err = project.commit(model).unwrap_err();
    assert!(matches!(
        err,
        HostError::DanglingReference { kind: "module", .. }
    ));
    assert_eq!(project.commit_count(), 0);
    assert!(project.libraries().is_empty());
    assert!(project.modules().is_empty());
}

#[test]
fn state_survives_save_and_load() {
    let tmp = tempdir().unwrap();
    let state = tmp.path().join("state/project.json");

    let mut project = InMemoryProject::new("ws", "/ws");
    let mut model = project.modifiable_model();
    model.modules.insert(HostModule::new("app", "/ws/app/app.iml"));
    project.commit(model).unwrap();
    project.save(&state).unwrap();

    let loaded = InMemoryProject::load(&state).unwrap();
    assert_eq!(loaded.modules(), project.modules());
    assert_eq!(loaded.name(), "ws");
    assert_eq!(loaded.id(), project.id());
}
