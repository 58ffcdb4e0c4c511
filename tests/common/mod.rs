//! Common test utilities shared across integration test files.
//!
//! Usage in test files:
//! ```ignore
//! mod common;
//! use common::*;
//! ```

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{Value, json};
use vertex_genai::{Client, NoAuth, VertexConfig};
use wiremock::MockServer;

pub const TEST_PROJECT: &str = "test-project";

/// Path of the `generateContent` method for the default model of [`TEST_PROJECT`].
pub fn generate_content_path() -> String {
    format!(
        "/v1beta1/projects/{}/locations/us-central1/publishers/google/models/gemini-1.5-flash-001:generateContent",
        TEST_PROJECT
    )
}

/// Creates an unauthenticated client pointed at the mock server.
pub fn mock_client(server: &MockServer) -> Client {
    Client::builder(VertexConfig::new(TEST_PROJECT).with_endpoint(server.uri()))
        .authenticator(Arc::new(NoAuth))
        .build()
        .expect("client should build")
}

/// A response whose only candidate answers with `text`.
pub fn text_body(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }],
        "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 8, "totalTokenCount": 20}
    })
}

/// A response whose only candidate asks for `name(args)`.
pub fn function_call_body(name: &str, args: Value) -> Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"functionCall": {"name": name, "args": args}}]},
            "finishReason": "STOP"
        }]
    })
}

/// Installs a `tracing` subscriber honouring `RUST_LOG`, once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
