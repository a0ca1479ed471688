//! Orchestration core: staging → mode selection → local generation or remote
//! compilation → assembled artifacts.
//!
//! # Lifecycle
//!
//! ```text
//! Idle → Staging → LocalGenerate   → Ready
//!                → RemoteCompiling → Ready
//!                                  → Failed → Idle
//! ```
//!
//! `clear()` returns to `Idle` from any state and releases the artifact set.
//! There is no terminal state; every process request runs the cycle again.
//!
//! # Readiness
//!
//! A new [`Session`] is not ready. [`Session::initialize`] resets the converter,
//! probes the compiler and then opens the readiness gate. `process` called
//! before that is rejected with [`StageError::Precondition`]; callers that need
//! to wait can await [`Readiness::wait`] instead of polling.
//!
//! # Overlapping requests
//!
//! `process` borrows the session mutably, so a second request cannot start on
//! the same session while one is in flight. The compilation request is built
//! from a snapshot taken before the network call.

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::artifact::{ArtifactAssembler, ArtifactRef};
use crate::compile::{CompilationRequest, CompilationResult, CompileFailure, FailureOrigin};
use crate::contract::{Compiler, LocalConverter};
use crate::error::StageError;
use crate::manifest::{
    analyze_sources, build_local, select_mode, LocalOutput, ProcessMode, ProjectManifest,
    SourceAnalysis,
};
use crate::store::{FileStore, RawContent, StagedFile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Idle,
    Staging,
    LocalGenerate,
    RemoteCompiling,
    Ready,
    Failed,
}

/// Completion signal for [`Session::initialize`].
#[derive(Debug, Clone)]
pub struct Readiness {
    rx: watch::Receiver<bool>,
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the session is initialised, or when it is dropped.
    pub async fn wait(mut self) {
        let _ = self.rx.wait_for(|ready| *ready).await;
    }
}

/// Output of a successful compiled-mode request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledOutput {
    pub manifest: ProjectManifest,
    /// One entry per translation unit that was sent.
    pub analysis: Vec<SourceAnalysis>,
    /// Number of files sent to the compiler.
    pub request_files: usize,
    pub generation: u64,
    pub js_ref: ArtifactRef,
    pub wasm_ref: ArtifactRef,
    /// Preview document wired to `js_ref`/`wasm_ref`.
    pub preview_html: String,
    /// Compiler stdout, if the server sent it.
    pub log: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    Local(LocalOutput),
    Compiled(CompiledOutput),
    /// Compilation did not succeed; store and artifacts are untouched.
    Failed(CompileFailure),
}

pub struct Session<L, C> {
    store: FileStore,
    converter: L,
    compiler: C,
    assembler: ArtifactAssembler,
    state: ProcessState,
    ready: watch::Sender<bool>,
    compiler_reachable: bool,
    last_failure: Option<CompileFailure>,
}

impl<L, C> Session<L, C>
where
    L: LocalConverter,
    C: Compiler,
{
    pub fn new(converter: L, compiler: C) -> Self {
        let (ready, _) = watch::channel(false);
        Session {
            store: FileStore::new(),
            converter,
            compiler,
            assembler: ArtifactAssembler::new(),
            state: ProcessState::Idle,
            ready,
            compiler_reachable: false,
            last_failure: None,
        }
    }

    /// Bring both collaborators up and open the readiness gate.
    ///
    /// An unreachable compiler does not fail initialisation; it only makes
    /// compiled-mode requests fail their precondition. Calling this again
    /// re-probes.
    pub async fn initialize(&mut self) {
        self.converter.reset();
        match self.compiler.probe().await {
            Ok(()) => {
                self.compiler_reachable = true;
                info!("Compiler endpoint reachable");
            }
            Err(failure) => {
                self.compiler_reachable = false;
                warn!(error = %failure, "Compiler endpoint not reachable; only local mode is available");
            }
        }
        self.ready.send_replace(true);
        info!("Session ready");
    }

    pub fn readiness(&self) -> Readiness {
        Readiness {
            rx: self.ready.subscribe(),
        }
    }

    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    pub fn compiler_reachable(&self) -> bool {
        self.compiler_reachable
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    pub fn snapshot(&self) -> Vec<StagedFile> {
        self.store.snapshot()
    }

    pub fn artifacts(&self) -> &ArtifactAssembler {
        &self.assembler
    }

    pub fn last_failure(&self) -> Option<&CompileFailure> {
        self.last_failure.as_ref()
    }

    pub fn add(&mut self, path: &str, raw: impl Into<RawContent>) -> &StagedFile {
        if matches!(
            self.state,
            ProcessState::Idle | ProcessState::Ready | ProcessState::Failed
        ) {
            self.transition(ProcessState::Staging);
        }
        self.store.add(path, raw)
    }

    pub fn remove(&mut self, path: &str) -> bool {
        let removed = self.store.remove(path);
        if self.store.is_empty() && self.state == ProcessState::Staging {
            self.transition(ProcessState::Idle);
        }
        removed
    }

    /// Empty the store, reset the converter and release any artifacts.
    pub fn clear(&mut self) {
        let dropped = self.store.len();
        self.store.clear();
        self.converter.reset();
        self.assembler.release();
        self.last_failure = None;
        self.transition(ProcessState::Idle);
        info!(dropped, "Session cleared");
    }

    /// Run one process request over the currently staged files.
    pub async fn process(&mut self) -> Result<ProcessOutcome, StageError> {
        if !self.is_ready() {
            return Err(StageError::precondition("session is not initialised"));
        }
        if self.store.is_empty() {
            return Err(StageError::precondition("no files staged"));
        }

        let snapshot = self.store.snapshot();
        let mode = select_mode(&snapshot);
        info!(?mode, files = snapshot.len(), total_size = self.store.total_size(), "Processing staged files");

        match mode {
            ProcessMode::Local => {
                self.transition(ProcessState::LocalGenerate);
                let output = build_local(&mut self.converter, &snapshot);
                self.transition(ProcessState::Ready);
                Ok(ProcessOutcome::Local(output))
            }
            ProcessMode::Compiled => {
                if !self.compiler_reachable {
                    return Err(StageError::precondition(
                        "compiler endpoint was not reachable at initialisation",
                    ));
                }
                self.compile(&snapshot).await
            }
        }
    }

    async fn compile(&mut self, snapshot: &[StagedFile]) -> Result<ProcessOutcome, StageError> {
        let manifest = ProjectManifest::from_snapshot(snapshot);
        let request = CompilationRequest::from_snapshot(snapshot);
        let analysis = analyze_sources(snapshot);
        if !analysis.iter().any(|a| a.has_main) {
            warn!(
                translation_units = analysis.len(),
                "No translation unit defines main; the module may not run on load"
            );
        }
        info!(files = request.len(), translation_units = analysis.len(), "Requesting remote compilation");

        self.transition(ProcessState::RemoteCompiling);
        let result = self.compiler.compile(&request).await;

        let (js, wasm, log) = match result {
            CompilationResult::Success { js, wasm, log } => (js, wasm, log),
            CompilationResult::Failure(failure) => {
                match failure.origin {
                    FailureOrigin::Compiler => warn!(
                        message = %failure.message,
                        diagnostic = failure.diagnostic.as_deref().unwrap_or(""),
                        "Compiler reported failure"
                    ),
                    FailureOrigin::Network => {
                        error!(message = %failure.message, "Compilation request did not complete")
                    }
                }
                self.fail();
                self.last_failure = Some(failure.clone());
                return Ok(ProcessOutcome::Failed(failure));
            }
        };

        let output = match self.assembler.assemble(&js, &wasm) {
            Ok(set) => CompiledOutput {
                manifest,
                analysis,
                request_files: request.len(),
                generation: set.generation(),
                js_ref: set.js_ref().clone(),
                wasm_ref: set.wasm_ref().clone(),
                preview_html: set.preview_document(),
                log,
            },
            Err(e) => {
                error!(error = %e, "Compiler returned undecodable artifacts");
                self.fail();
                return Err(e.into());
            }
        };

        self.last_failure = None;
        self.transition(ProcessState::Ready);
        info!(generation = output.generation, "Compilation succeeded");
        Ok(ProcessOutcome::Compiled(output))
    }

    fn fail(&mut self) {
        self.transition(ProcessState::Failed);
        self.transition(ProcessState::Idle);
    }

    fn transition(&mut self, next: ProcessState) {
        debug!(from = ?self.state, to = ?next, "State transition");
        self.state = next;
    }
}
