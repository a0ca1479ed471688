//! # contract: seams to the two external collaborators
//!
//! The orchestration core talks to exactly two things it does not own:
//!
//! - an in-process converter module ([`LocalConverter`]) that registers files and
//!   renders the manifest and index document without any network traffic;
//! - a remote compiler ([`Compiler`]) that turns sources and assets into a loader
//!   script plus a WebAssembly module.
//!
//! Both traits are annotated for `mockall`, so tests can assert how (and whether)
//! the core calls into them. Mocks are exported under the `test-export-mocks`
//! feature for use from integration tests.

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::classify::FileKind;
use crate::compile::{CompilationRequest, CompilationResult, CompileFailure};
use crate::store::FileContent;

/// One registry entry as reported by the converter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub size: u64,
}

/// The in-process converter module. Only called in local mode.
///
/// `register_file` receives content in the same form the store holds it:
/// text verbatim, binaries already transport-encoded. `size` is the original
/// byte length recorded by the store and is what the manifest reports.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait LocalConverter: Send {
    /// Drop every registered file.
    fn reset(&mut self);

    fn register_file(&mut self, path: &str, kind: FileKind, size: u64, content: &FileContent);

    fn file_count(&self) -> usize;

    fn file_info(&self, index: usize) -> Option<FileInfo>;

    /// Manifest JSON, `{"files":[{"name","type","size"},...]}`.
    fn generate_manifest(&self) -> String;

    /// Human-readable HTML index of the registered files.
    fn generate_index(&self) -> String;
}

/// The remote compilation service.
///
/// Implementors never return transport errors through a side channel: every
/// outcome, including an unreachable server, is a [`CompilationResult`].
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Compiler: Send + Sync {
    /// Check that the service answers at all. Any HTTP response counts.
    async fn probe(&self) -> Result<(), CompileFailure>;

    /// Send one request and wait for its single response. No retries.
    async fn compile(&self, request: &CompilationRequest) -> CompilationResult;
}
