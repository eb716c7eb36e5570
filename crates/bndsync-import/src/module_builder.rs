use std::path::Path;

use bndsync_host::{
    root_url, CompilerOutput, HostModule, HostProject, LanguageLevel, ProjectModification,
};
use bndsync_model::ProjectUnit;

use crate::{ImportError, JAVAC_SOURCE, JAVAC_TARGET, OSGI_FACET_ID};

/// Module descriptor path: `<dir>/<name>.iml`.
pub fn module_file(dir: &Path, name: &str) -> std::path::PathBuf {
    dir.join(format!("{name}.iml"))
}

/// Create or refresh the module skeleton of `unit`.
///
/// Content roots and every order entry except module sources and the SDK are
/// rebuilt from scratch; dependency entries are added later, once all
/// skeletons exist. The skeleton is registered in `model.modules` and a
/// working copy is returned for wiring.
pub fn build_module(
    model: &mut ProjectModification,
    unit: &dyn ProjectUnit,
    project_level: Option<LanguageLevel>,
) -> Result<HostModule, ImportError> {
    let name = unit.name();
    let base = unit.base();

    let content_url = root_url(&base)?;
    let source_urls = unit
        .source_path()
        .iter()
        .map(|path| root_url(path))
        .collect::<Result<Vec<_>, _>>()?;
    let test_url = unit.test_src().map(|path| root_url(&path)).transpose()?;
    let exclude_url = root_url(&unit.target())?;
    let output_url = root_url(&unit.src_output())?;
    let test_output_url = root_url(&unit.test_output())?;

    let mut module = model
        .modules
        .find(name)
        .cloned()
        .unwrap_or_else(|| HostModule::new(name, module_file(&base, name)));

    module.clear_content_roots();
    module
        .order_entries
        .retain(|entry| entry.is_sdk() || entry.is_module_source());
    module.inherit_sdk();

    let content = module.add_content_root(content_url);
    for url in source_urls {
        content.add_source_folder(url, false);
    }
    if let Some(url) = test_url {
        content.add_source_folder(url, true);
    }
    content.add_exclude_folder(exclude_url);

    let level = unit
        .property(JAVAC_SOURCE)
        .and_then(|value| LanguageLevel::parse(&value));
    module.language_level = level.filter(|level| Some(*level) != project_level);

    module.compiler_output = CompilerOutput {
        inherit: false,
        exclude_output: true,
        output: Some(output_url),
        test_output: Some(test_output_url),
    };

    model
        .compiler
        .set_module_bytecode_target(name, unit.property(JAVAC_TARGET));

    module.facets.remove(OSGI_FACET_ID);

    model.modules.insert(module.clone());
    Ok(module)
}

/// Add the module covering the whole host project directory.
pub fn create_root_module(
    model: &mut ProjectModification,
    project: &dyn HostProject,
) -> Result<(), ImportError> {
    let base = project.base_path().ok_or_else(|| ImportError::NoBasePath {
        project: project.name().to_string(),
    })?;
    let mut module = HostModule::new(project.name(), module_file(base, project.name()));
    module.add_content_root(root_url(base)?);
    module.inherit_sdk();
    model.modules.insert(module);
    Ok(())
}
