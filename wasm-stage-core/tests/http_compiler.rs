use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use wasm_stage_core::compile::{CompilationRequest, RequestFile};
use wasm_stage_core::{
    decode, CompilationResult, Compiler, EncodedBytes, FailureOrigin, FileStore, HttpCompiler,
};

/// Serve `app` on an ephemeral port and return the compile endpoint URL.
async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });
    format!("http://{addr}/compile")
}

fn client(endpoint: &str) -> HttpCompiler {
    HttpCompiler::new(endpoint, Duration::from_secs(5)).expect("client builds")
}

fn sample_request() -> CompilationRequest {
    let mut store = FileStore::new();
    store.add("main.cpp", "int main(){}");
    store.add("logo.png", vec![0x89, 0x50, 0x4E, 0x47]);
    CompilationRequest::from_snapshot(&store.snapshot())
}

#[tokio::test]
async fn test_success_response_carries_both_artifacts() {
    let app = Router::new().route(
        "/compile",
        post(|Json(body): Json<Value>| async move {
            // Echo the file names back as the "loader" so the test can see them.
            let names: Vec<String> = body["files"]
                .as_array()
                .map(|files| {
                    files
                        .iter()
                        .filter_map(|f| f["name"].as_str().map(String::from))
                        .collect()
                })
                .unwrap_or_default();
            let js = wasm_stage_core::encode(names.join(",").as_bytes());
            let wasm = wasm_stage_core::encode(&[0x00, 0x61, 0x73, 0x6d]);
            Json(json!({
                "js": js.as_str(),
                "wasm": wasm.as_str(),
                "stdout": "emcc ok",
                "stderr": ""
            }))
        }),
    );
    let endpoint = serve(app).await;

    let result = client(&endpoint).compile(&sample_request()).await;
    match result {
        CompilationResult::Success { js, wasm, log } => {
            assert_eq!(decode(&js).unwrap(), b"main.cpp,logo.png");
            assert_eq!(decode(&wasm).unwrap(), [0x00, 0x61, 0x73, 0x6d]);
            assert_eq!(log.as_deref(), Some("emcc ok"));
        }
        other => panic!("Expected success, got {other:?}"),
    }
}

#[tokio::test]
async fn test_request_body_matches_wire_format() {
    let app = Router::new().route(
        "/compile",
        post(|Json(body): Json<Value>| async move {
            let files: Vec<RequestFile> =
                serde_json::from_value(body["files"].clone()).unwrap_or_default();
            let ok = files.len() == 2
                && files[0].name == "main.cpp"
                && files[0].content == "int main(){}"
                && files[1].name == "logo.png"
                && files[1].content == "iVBORw==";
            if ok {
                (StatusCode::OK, Json(json!({"js": "", "wasm": ""})))
            } else {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": format!("unexpected body: {body}")})),
                )
            }
        }),
    );
    let endpoint = serve(app).await;

    let result = client(&endpoint).compile(&sample_request()).await;
    assert!(result.is_success(), "Server rejected body: {result:?}");
}

#[tokio::test]
async fn test_compiler_error_body_is_compiler_failure() {
    let app = Router::new().route(
        "/compile",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "compilation failed",
                    "stderr": "main.cpp:1:11: error: expected '}'",
                    "stdout": ""
                })),
            )
        }),
    );
    let endpoint = serve(app).await;

    match client(&endpoint).compile(&sample_request()).await {
        CompilationResult::Failure(failure) => {
            assert_eq!(failure.origin, FailureOrigin::Compiler);
            assert_eq!(failure.message, "compilation failed");
            assert_eq!(
                failure.diagnostic.as_deref(),
                Some("main.cpp:1:11: error: expected '}'")
            );
        }
        other => panic!("Expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_non_json_body_is_network_failure() {
    let app = Router::new().route(
        "/compile",
        post(|| async { (StatusCode::BAD_GATEWAY, "upstream went away") }),
    );
    let endpoint = serve(app).await;

    match client(&endpoint).compile(&sample_request()).await {
        CompilationResult::Failure(failure) => assert_eq!(failure.origin, FailureOrigin::Network),
        other => panic!("Expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_endpoint_is_network_failure() {
    // Grab a free port, then close it again.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let endpoint = format!("http://{addr}/compile");

    let compiler = client(&endpoint);
    assert!(compiler.probe().await.is_err(), "Probe should fail");
    match compiler.compile(&sample_request()).await {
        CompilationResult::Failure(failure) => {
            assert_eq!(failure.origin, FailureOrigin::Network);
            assert!(failure.message.contains(&addr.to_string()));
        }
        other => panic!("Expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_probe_accepts_any_http_answer() {
    // Only POST is routed, so the probe's GET receives 405.
    let app = Router::new().route("/compile", post(|| async { Json(json!({})) }));
    let endpoint = serve(app).await;

    assert!(client(&endpoint).probe().await.is_ok());
}

#[tokio::test]
async fn test_probe_gives_up_before_compile_timeout() {
    // The endpoint accepts the connection but never answers in time.
    let app = Router::new().route(
        "/compile",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            "late"
        }),
    );
    let endpoint = serve(app).await;
    let compiler = HttpCompiler::new(endpoint.as_str(), Duration::from_secs(120))
        .expect("client builds")
        .with_probe_timeout(Duration::from_millis(200));

    let probe = tokio::time::timeout(Duration::from_secs(5), compiler.probe())
        .await
        .expect("Probe should not wait for the compile timeout");
    let failure = probe.expect_err("A silent endpoint is unreachable");
    assert_eq!(failure.origin, FailureOrigin::Network);
}

#[tokio::test]
async fn test_empty_object_is_malformed() {
    let app = Router::new().route("/compile", post(|| async { Json(json!({})) }));
    let endpoint = serve(app).await;

    match client(&endpoint).compile(&sample_request()).await {
        CompilationResult::Failure(failure) => {
            assert_eq!(failure.origin, FailureOrigin::Network);
            assert!(failure.message.contains("malformed"));
        }
        other => panic!("Expected failure, got {other:?}"),
    }
}

#[test]
fn test_encoded_bytes_serialize_as_plain_strings() {
    let value = serde_json::to_value(EncodedBytes::from_transport("QUJD")).unwrap();
    assert_eq!(value, json!("QUJD"));
}
