#![doc = "wasm-stage-core: staging, classification and compilation orchestration for wasm-stage."]

//! This crate holds the whole pipeline: the in-memory file store, the
//! classifier, the transport encoding, manifest generation, the remote compiler
//! protocol and the artifact assembler, tied together by [`session::Session`].
//!
//! The two external collaborators (the in-process converter and the remote
//! compiler) are reached only through the traits in [`contract`].
//!
//! # Usage
//! Construct a [`Session`] with a [`LocalConverter`] and a [`Compiler`], call
//! [`Session::initialize`], stage files with [`Session::add`], then
//! [`Session::process`].

pub mod artifact;
pub mod classify;
pub mod compile;
pub mod contract;
pub mod converter;
pub mod encoding;
pub mod error;
pub mod manifest;
pub mod session;
pub mod store;

pub use artifact::{ArtifactAssembler, ArtifactRef, ArtifactSet, Download};
pub use classify::{classify, Classification, FileKind};
pub use compile::{
    CompilationRequest, CompilationResult, CompileFailure, FailureOrigin, HttpCompiler,
};
pub use contract::{Compiler, FileInfo, LocalConverter};
pub use converter::BuiltinConverter;
pub use encoding::{decode, encode, EncodedBytes, EncodingError};
pub use error::StageError;
pub use manifest::{select_mode, LocalOutput, ProcessMode, ProjectManifest, SourceAnalysis};
pub use session::{CompiledOutput, ProcessOutcome, ProcessState, Readiness, Session};
pub use store::{FileContent, FileStore, RawContent, StagedFile};
