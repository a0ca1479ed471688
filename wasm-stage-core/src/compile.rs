//! Remote compilation: request payload, response protocol and the HTTP client.
//!
//! Wire format (JSON over a single POST route):
//!
//! - request: `{"files":[{"name":..., "content":...}, ...]}`
//! - success: `{"js": <base64>, "wasm": <base64>, "stdout"?: ..., "stderr"?: ...}`
//! - failure: `{"error": ..., "stderr"?: ..., "stdout"?: ...}`
//!
//! The server answers failures with 4xx/5xx status codes *and* an error body, so
//! responses are classified by body only.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::contract::Compiler;
use crate::encoding::EncodedBytes;
use crate::store::StagedFile;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Upper bound for the reachability probe, independent of the compile timeout.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

const MALFORMED_RESPONSE: &str = "malformed response from compiler";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestFile {
    pub name: String,
    pub content: String,
}

/// Payload sent to the compiler, built once from a store snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompilationRequest {
    pub files: Vec<RequestFile>,
}

impl CompilationRequest {
    /// Sources and headers in store order, followed by every other file.
    pub fn from_snapshot(snapshot: &[StagedFile]) -> Self {
        let (sources, assets): (Vec<&StagedFile>, Vec<&StagedFile>) =
            snapshot.iter().partition(|f| f.kind.is_compilable());

        let files = sources
            .into_iter()
            .chain(assets)
            .map(|f| RequestFile {
                name: f.path.clone(),
                content: f.content.as_transport_str().to_string(),
            })
            .collect();
        CompilationRequest { files }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&RequestFile> {
        self.files.iter().find(|f| f.name == name)
    }
}

/// Where a failure came from. Only affects logging; callers treat both alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOrigin {
    Compiler,
    Network,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileFailure {
    pub origin: FailureOrigin,
    pub message: String,
    pub diagnostic: Option<String>,
}

impl CompileFailure {
    pub fn compiler(message: impl Into<String>, diagnostic: Option<String>) -> Self {
        CompileFailure {
            origin: FailureOrigin::Compiler,
            message: message.into(),
            diagnostic,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        CompileFailure {
            origin: FailureOrigin::Network,
            message: message.into(),
            diagnostic: None,
        }
    }
}

impl std::fmt::Display for CompileFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.origin {
            FailureOrigin::Compiler => write!(f, "compilation failed: {}", self.message),
            FailureOrigin::Network => write!(f, "compiler unreachable: {}", self.message),
        }
    }
}

impl std::error::Error for CompileFailure {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompilationResult {
    Success {
        js: EncodedBytes,
        wasm: EncodedBytes,
        /// Compiler stdout, when the server forwards it.
        log: Option<String>,
    },
    Failure(CompileFailure),
}

impl CompilationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, CompilationResult::Success { .. })
    }
}

#[derive(Debug, Deserialize)]
struct RawResponse {
    js: Option<String>,
    wasm: Option<String>,
    error: Option<String>,
    stderr: Option<String>,
    stdout: Option<String>,
}

/// Classify a response body. An error field wins over artifacts.
pub fn parse_response(body: &str) -> CompilationResult {
    let raw: RawResponse = match serde_json::from_str(body) {
        Ok(raw) => raw,
        Err(e) => {
            debug!(error = %e, "Compiler response is not valid JSON");
            return CompilationResult::Failure(CompileFailure::network(MALFORMED_RESPONSE));
        }
    };

    if let Some(error) = raw.error {
        let diagnostic = raw.stderr.filter(|s| !s.is_empty()).or(raw.stdout);
        return CompilationResult::Failure(CompileFailure::compiler(error, diagnostic));
    }

    match (raw.js, raw.wasm) {
        (Some(js), Some(wasm)) => CompilationResult::Success {
            js: EncodedBytes::from_transport(js),
            wasm: EncodedBytes::from_transport(wasm),
            log: raw.stdout.filter(|s| !s.is_empty()),
        },
        _ => CompilationResult::Failure(CompileFailure::network(MALFORMED_RESPONSE)),
    }
}

/// [`Compiler`] over HTTP with `reqwest`.
pub struct HttpCompiler {
    http: reqwest::Client,
    endpoint: String,
    probe_timeout: Duration,
}

impl HttpCompiler {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let endpoint = endpoint.into();
        info!(endpoint = %endpoint, timeout_secs = timeout.as_secs(), "Initialised HTTP compiler client");
        Ok(HttpCompiler {
            http,
            endpoint,
            probe_timeout: DEFAULT_PROBE_TIMEOUT.min(timeout),
        })
    }

    pub fn with_probe_timeout(mut self, probe_timeout: Duration) -> Self {
        self.probe_timeout = probe_timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Compiler for HttpCompiler {
    async fn probe(&self) -> Result<(), CompileFailure> {
        let probe = self.http.get(&self.endpoint).timeout(self.probe_timeout);
        match probe.send().await {
            Ok(resp) => {
                debug!(endpoint = %self.endpoint, status = %resp.status(), "Compiler endpoint answered probe");
                Ok(())
            }
            Err(e) => Err(CompileFailure::network(format!(
                "could not reach {}: {e}",
                self.endpoint
            ))),
        }
    }

    async fn compile(&self, request: &CompilationRequest) -> CompilationResult {
        info!(endpoint = %self.endpoint, files = request.len(), "Sending compilation request");

        let response = match self.http.post(&self.endpoint).json(request).send().await {
            Ok(resp) => resp,
            Err(e) => {
                return CompilationResult::Failure(CompileFailure::network(format!(
                    "request to {} failed: {e}",
                    self.endpoint
                )))
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return CompilationResult::Failure(CompileFailure::network(format!(
                    "failed to read compiler response: {e}"
                )))
            }
        };
        debug!(status = %status, body_len = body.len(), "Received compiler response");

        parse_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_field_wins_over_artifacts() {
        let result = parse_response(r#"{"error":"boom","js":"","wasm":"","stderr":"x.cpp:1: error"}"#);
        assert_eq!(
            result,
            CompilationResult::Failure(CompileFailure::compiler("boom", Some("x.cpp:1: error".into())))
        );
    }

    #[test]
    fn missing_artifact_is_malformed() {
        let result = parse_response(r#"{"js":"AAAA"}"#);
        match result {
            CompilationResult::Failure(f) => assert_eq!(f.origin, FailureOrigin::Network),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn html_error_page_is_network_failure() {
        let result = parse_response("<html>502 Bad Gateway</html>");
        assert!(matches!(
            result,
            CompilationResult::Failure(CompileFailure { origin: FailureOrigin::Network, .. })
        ));
    }

    #[test]
    fn success_keeps_stdout() {
        let result = parse_response(r#"{"js":"YQ==","wasm":"AGFzbQ==","stdout":"ok","stderr":""}"#);
        assert_eq!(
            result,
            CompilationResult::Success {
                js: EncodedBytes::from_transport("YQ=="),
                wasm: EncodedBytes::from_transport("AGFzbQ=="),
                log: Some("ok".into()),
            }
        );
    }
}
