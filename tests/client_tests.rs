//! Transport-level tests for `Client` against a mock endpoint.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use serde_json::json;
use vertex_genai::{
    Client, Content, GenerateContentRequest, ModelBackend, NoAuth, StaticTokenAuthenticator,
    VertexConfig, VertexError, weather_declaration,
};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn hello_request() -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content::user_text("Hello")],
        tools: vec![],
    }
}

#[tokio::test]
async fn test_static_token_is_sent_as_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(generate_content_path()))
        .and(header("authorization", "Bearer ya29.test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_body("Hi")))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::builder(VertexConfig::new(TEST_PROJECT).with_endpoint(server.uri()))
        .authenticator(Arc::new(
            StaticTokenAuthenticator::new("ya29.test-token").unwrap(),
        ))
        .build()
        .unwrap();

    let response = client.generate_content(&hello_request()).await.unwrap();
    assert_eq!(
        response.first_candidate_content().unwrap().parts[0].as_text(),
        Some("Hi")
    );
}

#[tokio::test]
async fn test_usage_metadata_is_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(generate_content_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_body("Hi")))
        .mount(&server)
        .await;

    let response = mock_client(&server)
        .generate_content(&hello_request())
        .await
        .unwrap();
    let usage = response.usage_metadata.unwrap();
    assert_eq!(usage.prompt_token_count, Some(12));
    assert_eq!(usage.total_token_count, Some(20));
}

#[tokio::test]
async fn test_empty_tools_are_omitted_from_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(generate_content_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_body("Hi")))
        .mount(&server)
        .await;

    mock_client(&server)
        .generate_content(&hello_request())
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = requests[0].body_json().unwrap();
    assert!(body.get("tools").is_none());
    assert_eq!(
        body["contents"],
        json!([{"role": "user", "parts": [{"text": "Hello"}]}])
    );
}

#[tokio::test]
async fn test_declarations_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(generate_content_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_body("Hi")))
        .mount(&server)
        .await;

    let request = GenerateContentRequest {
        contents: vec![Content::user_text("Weather?")],
        tools: vec![weather_declaration().into_tool()],
    };
    mock_client(&server).generate_content(&request).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = requests[0].body_json().unwrap();
    assert_eq!(
        body["tools"][0]["functionDeclarations"][0]["parameters"]["properties"]["location"]["type"],
        "STRING"
    );
}

#[tokio::test]
async fn test_custom_model_and_location_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(
            "/v1beta1/projects/other-project/locations/europe-west4/publishers/google/models/gemini-2.0-flash:generateContent",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_body("Hi")))
        .expect(1)
        .mount(&server)
        .await;

    let config = VertexConfig::new("other-project")
        .with_location("europe-west4")
        .with_model("gemini-2.0-flash")
        .with_endpoint(format!("{}/", server.uri()));
    let client = Client::builder(config)
        .authenticator(Arc::new(NoAuth))
        .build()
        .unwrap();

    client.generate_content(&hello_request()).await.unwrap();
}

#[tokio::test]
async fn test_server_error_is_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(generate_content_path()))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = mock_client(&server)
        .generate_content(&hello_request())
        .await
        .unwrap_err();
    match &err {
        VertexError::Api {
            status_code,
            message,
            request_id,
        } => {
            assert_eq!(*status_code, 503);
            assert_eq!(message, "<empty body>");
            assert!(request_id.is_none());
        }
        other => panic!("expected an API error, got {other:?}"),
    }
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_bad_request_is_not_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(generate_content_path()))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "Invalid JSON payload", "status": "INVALID_ARGUMENT"}
        })))
        .mount(&server)
        .await;

    let err = mock_client(&server)
        .generate_content(&hello_request())
        .await
        .unwrap_err();
    assert!(matches!(err, VertexError::Api { status_code: 400, .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_transport_timeout_is_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(generate_content_path()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(text_body("late"))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client = Client::builder(VertexConfig::new(TEST_PROJECT).with_endpoint(server.uri()))
        .authenticator(Arc::new(NoAuth))
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();

    let err = client.generate_content(&hello_request()).await.unwrap_err();
    match err {
        VertexError::Http(e) => assert!(e.is_timeout()),
        other => panic!("expected an HTTP error, got {other:?}"),
    }
}
