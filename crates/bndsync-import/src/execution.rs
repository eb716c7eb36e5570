//! Execution strategies for an import cycle.
//!
//! Host models are owned by a single model thread. Resolution runs on a
//! background pool and never touches the host; its result is handed to the
//! model thread with one dispatch, where the structure is built and committed.
//! The synchronous strategy does both inline on the caller's thread.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use bndsync_host::HostProject;
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use rayon::ThreadPool;
use tokio_util::sync::CancellationToken;

use crate::pipeline::{setup_project, ImportState, ImportSummary, Importer, ResolvedImport};
use crate::progress::ProgressSender;
use crate::ImportError;

type Job<P> = Box<dyn FnOnce(&mut P) + Send + 'static>;

enum Message<P> {
    Run(Job<P>),
    Shutdown,
}

/// Sends work to a [`ModelThread`].
pub struct ModelDispatcher<P> {
    tx: Sender<Message<P>>,
}

impl<P> Clone for ModelDispatcher<P> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<P: 'static> ModelDispatcher<P> {
    /// Queue `job` behind everything already dispatched.
    pub fn invoke_later(
        &self,
        job: impl FnOnce(&mut P) + Send + 'static,
    ) -> Result<(), ImportError> {
        self.tx
            .send(Message::Run(Box::new(job)))
            .map_err(|_| ImportError::ModelThreadGone)
    }

    pub fn invoke_and_wait<R: Send + 'static>(
        &self,
        job: impl FnOnce(&mut P) -> R + Send + 'static,
    ) -> Result<R, ImportError> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        self.invoke_later(move |project| {
            let _ = tx.send(job(project));
        })?;
        rx.recv().map_err(|_| ImportError::ModelThreadGone)
    }
}

/// The thread that owns a host project. Jobs run one at a time in dispatch
/// order, which serializes structure building across overlapping imports.
pub struct ModelThread<P> {
    dispatcher: ModelDispatcher<P>,
    handle: JoinHandle<P>,
}

impl<P: Send + 'static> ModelThread<P> {
    pub fn spawn(mut project: P) -> io::Result<Self> {
        let (tx, rx) = crossbeam_channel::unbounded::<Message<P>>();
        let handle = thread::Builder::new()
            .name("bndsync-model".to_string())
            .spawn(move || {
                for message in rx {
                    match message {
                        Message::Run(job) => job(&mut project),
                        Message::Shutdown => break,
                    }
                }
                project
            })?;
        Ok(Self {
            dispatcher: ModelDispatcher { tx },
            handle,
        })
    }

    pub fn dispatcher(&self) -> ModelDispatcher<P> {
        self.dispatcher.clone()
    }

    /// Run the remaining queued jobs, stop the thread and return the project.
    pub fn shutdown(self) -> Result<P, ImportError> {
        let _ = self.dispatcher.tx.send(Message::Shutdown);
        self.handle.join().map_err(|_| ImportError::ModelThreadGone)
    }
}

enum ResolvePool {
    Rayon(ThreadPool),
    Inline,
}

/// Resolves on a dedicated worker and builds structure on the model thread.
pub struct BackgroundExecutor<P> {
    pool: ResolvePool,
    dispatcher: ModelDispatcher<P>,
}

impl<P: HostProject + 'static> BackgroundExecutor<P> {
    pub fn new(dispatcher: ModelDispatcher<P>) -> Self {
        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(1)
            .thread_name(|idx| format!("bndsync-resolve-{idx}"))
            .build()
        {
            Ok(pool) => ResolvePool::Rayon(pool),
            Err(err) => {
                // Thread limits in sandboxes; resolve on the caller instead.
                tracing::warn!(
                    target = "bndsync.import",
                    error = %err,
                    "cannot start resolve worker; resolving inline"
                );
                ResolvePool::Inline
            }
        };
        Self { pool, dispatcher }
    }

    pub fn dispatcher(&self) -> &ModelDispatcher<P> {
        &self.dispatcher
    }

    fn spawn(&self, job: impl FnOnce() + Send + 'static) {
        match &self.pool {
            ResolvePool::Rayon(pool) => pool.spawn(job),
            ResolvePool::Inline => job(),
        }
    }
}

pub enum Execution<'a, P> {
    /// Everything inline on the caller's thread, which owns the project.
    Synchronous(&'a mut P),
    Background(&'a BackgroundExecutor<P>),
}

/// Result of one cycle as seen by the caller.
pub struct ImportHandle {
    token: CancellationToken,
    state: Arc<Mutex<ImportState>>,
    result: Receiver<Result<ImportSummary, ImportError>>,
}

impl ImportHandle {
    /// Request cancellation. Only effective while units are being resolved.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn state(&self) -> ImportState {
        *self.state.lock()
    }

    /// Block until the cycle has finished.
    pub fn wait(self) -> Result<ImportSummary, ImportError> {
        self.result
            .recv()
            .unwrap_or(Err(ImportError::ModelThreadGone))
    }
}

/// One import cycle: resolve, then build the structure.
pub struct ImportPipeline {
    importer: Importer,
    refresh: bool,
    setup: bool,
    progress: ProgressSender,
    token: CancellationToken,
}

impl ImportPipeline {
    pub fn new(importer: Importer) -> Self {
        Self {
            importer,
            refresh: false,
            setup: false,
            progress: ProgressSender::detached(),
            token: CancellationToken::new(),
        }
    }

    /// Rescan host files after the commit.
    pub fn refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    /// Apply workspace compiler settings before resolving.
    pub fn with_project_setup(mut self, setup: bool) -> Self {
        self.setup = setup;
        self
    }

    pub fn progress(mut self, progress: ProgressSender) -> Self {
        self.progress = progress;
        self
    }

    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    pub fn importer(&self) -> &Importer {
        &self.importer
    }

    pub fn run<P: HostProject + 'static>(self, execution: Execution<'_, P>) -> ImportHandle {
        let state = Arc::new(Mutex::new(ImportState::Idle));
        let (tx, rx) = crossbeam_channel::bounded(1);
        let handle = ImportHandle {
            token: self.token.clone(),
            state: Arc::clone(&state),
            result: rx,
        };

        let ImportPipeline {
            importer,
            refresh,
            setup,
            progress,
            token,
        } = self;

        match execution {
            Execution::Synchronous(project) => {
                if setup {
                    importer.setup_project(project);
                }
                let result = match resolve(&state, importer, &token, &progress) {
                    Ok(resolved) => build(&state, resolved, project, refresh),
                    Err(err) => Err(err),
                };
                let _ = tx.send(result);
            }
            Execution::Background(executor) => {
                if setup {
                    let workspace = Arc::clone(importer.workspace());
                    let dispatched = executor
                        .dispatcher
                        .invoke_later(move |project: &mut P| setup_project(&*workspace, project));
                    if let Err(err) = dispatched {
                        set_state(&state, ImportState::Failed);
                        let _ = tx.send(Err(err));
                        return handle;
                    }
                }

                let dispatcher = executor.dispatcher.clone();
                executor.spawn(move || {
                    let resolved = match resolve(&state, importer, &token, &progress) {
                        Ok(resolved) => resolved,
                        Err(err) => {
                            let _ = tx.send(Err(err));
                            return;
                        }
                    };

                    let job_state = Arc::clone(&state);
                    let job_tx = tx.clone();
                    let dispatched = dispatcher.invoke_later(move |project: &mut P| {
                        let _ = job_tx.send(build(&job_state, resolved, project, refresh));
                    });
                    if let Err(err) = dispatched {
                        set_state(&state, ImportState::Failed);
                        let _ = tx.send(Err(err));
                    }
                });
            }
        }

        handle
    }
}

fn set_state(state: &Mutex<ImportState>, next: ImportState) {
    *state.lock() = next;
}

fn resolve(
    state: &Mutex<ImportState>,
    importer: Importer,
    token: &CancellationToken,
    progress: &ProgressSender,
) -> Result<ResolvedImport, ImportError> {
    set_state(state, ImportState::Resolving);
    match importer.resolve(token, progress) {
        Ok(resolved) => {
            set_state(state, ImportState::Resolved);
            Ok(resolved)
        }
        Err(err) => {
            set_state(state, ImportState::Failed);
            Err(err)
        }
    }
}

fn build(
    state: &Mutex<ImportState>,
    resolved: ResolvedImport,
    project: &mut dyn HostProject,
    refresh: bool,
) -> Result<ImportSummary, ImportError> {
    set_state(state, ImportState::BuildingStructure);
    let result = resolved.build_structure(project, refresh);
    set_state(
        state,
        if result.is_ok() {
            ImportState::Done
        } else {
            ImportState::Failed
        },
    );
    result
}
