mod failures;
mod registry;

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bndsync_host::{root_url, InMemoryProject};
use bndsync_import::{
    Execution, ImportError, ImportPipeline, ImportSummary, Importer, Reporter,
};
use bndsync_model::{
    ExternalWorkspace, SnapshotProject, SnapshotWorkspace, WorkspaceSnapshotFile,
    WORKSPACE_SNAPSHOT_REL_PATH,
};
use tempfile::TempDir;
use zip::write::FileOptions;

/// A scratch Bnd workspace on disk.
pub(crate) struct Fixture {
    _dir: TempDir,
    pub base: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("ws");
        std::fs::create_dir_all(base.join("cnf")).unwrap();
        Self { _dir: dir, base }
    }

    /// A snapshot project whose directory exists.
    pub fn project(&self, name: &str) -> SnapshotProject {
        std::fs::create_dir_all(self.base.join(name)).unwrap();
        SnapshotProject::new(name)
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.base.join(rel)
    }

    pub fn jar(&self, rel: &str, entries: &[&str]) -> PathBuf {
        let path = self.base.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut jar = zip::ZipWriter::new(File::create(&path).unwrap());
        for entry in entries {
            jar.start_file(*entry, FileOptions::<()>::default()).unwrap();
            jar.write_all(b"x").unwrap();
        }
        jar.finish().unwrap();
        path
    }

    pub fn snapshot(&self, projects: Vec<SnapshotProject>) -> WorkspaceSnapshotFile {
        WorkspaceSnapshotFile {
            projects,
            ..WorkspaceSnapshotFile::default()
        }
    }

    pub fn workspace(&self, projects: Vec<SnapshotProject>) -> Arc<SnapshotWorkspace> {
        Arc::new(SnapshotWorkspace::from_snapshot(
            &self.base,
            self.snapshot(projects),
        ))
    }

    pub fn write_snapshot(&self, file: &WorkspaceSnapshotFile) {
        let path = self.base.join(WORKSPACE_SNAPSHOT_REL_PATH);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, serde_json::to_vec_pretty(file).unwrap()).unwrap();
    }

    pub fn host(&self) -> InMemoryProject {
        InMemoryProject::new("demo", &self.base)
    }
}

pub(crate) fn url(path: &Path) -> String {
    root_url(path).unwrap()
}

pub(crate) fn importer(workspace: Arc<SnapshotWorkspace>, reporter: Reporter) -> Importer {
    let units = workspace.projects().unwrap();
    Importer::new(workspace, units, reporter)
}

/// One synchronous cycle over every unit of `workspace`.
pub(crate) fn import(
    workspace: &Arc<SnapshotWorkspace>,
    host: &mut InMemoryProject,
    reporter: Reporter,
) -> Result<ImportSummary, ImportError> {
    ImportPipeline::new(importer(Arc::clone(workspace), reporter))
        .run(Execution::Synchronous(host))
        .wait()
}
