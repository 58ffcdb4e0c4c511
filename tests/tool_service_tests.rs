//! Tools that share state through a `ToolService`, driven end to end.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use common::*;
use serde_json::{Value, json};
use vertex_genai::{
    CallableFunction, Conversation, FunctionDeclaration, FunctionError, FunctionRegistry,
    ToolService,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// State shared by every tool the service hands out.
struct StationState {
    unit: String,
    lookups: AtomicUsize,
}

struct TemperatureTool {
    state: Arc<StationState>,
}

#[async_trait]
impl CallableFunction for TemperatureTool {
    fn declaration(&self) -> FunctionDeclaration {
        FunctionDeclaration::builder("get_temperature")
            .description("Current temperature at a station")
            .parameter("station", json!({"type": "STRING"}))
            .required(["station"])
            .build()
    }

    async fn call(&self, args: Value) -> Result<Value, FunctionError> {
        self.state.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(json!({"station": args["station"], "temperature": 21, "unit": self.state.unit}))
    }
}

struct HumidityTool {
    state: Arc<StationState>,
}

#[async_trait]
impl CallableFunction for HumidityTool {
    fn declaration(&self) -> FunctionDeclaration {
        FunctionDeclaration::builder("get_humidity")
            .description("Current relative humidity at a station")
            .parameter("station", json!({"type": "STRING"}))
            .required(["station"])
            .build()
    }

    async fn call(&self, args: Value) -> Result<Value, FunctionError> {
        self.state.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(json!({"station": args["station"], "humidity": 40}))
    }
}

struct StationService {
    state: Arc<StationState>,
}

impl ToolService for StationService {
    fn tools(&self) -> Vec<Arc<dyn CallableFunction>> {
        vec![
            Arc::new(TemperatureTool {
                state: Arc::clone(&self.state),
            }),
            Arc::new(HumidityTool {
                state: Arc::clone(&self.state),
            }),
        ]
    }
}

#[tokio::test]
async fn test_service_tools_resolve_across_rounds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(generate_content_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(function_call_body(
            "get_temperature",
            json!({"station": "KBOS"}),
        )))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(generate_content_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(function_call_body(
            "get_humidity",
            json!({"station": "KBOS"}),
        )))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(generate_content_path()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(text_body("21°C and 40% humidity at KBOS.")),
        )
        .mount(&server)
        .await;

    let state = Arc::new(StationState {
        unit: "celsius".to_string(),
        lookups: AtomicUsize::new(0),
    });
    let mut registry = FunctionRegistry::new();
    registry.register_service(&StationService {
        state: Arc::clone(&state),
    });
    assert_eq!(registry.len(), 2);

    let outcome = Conversation::new(mock_client(&server), registry)
        .run("Conditions at KBOS?")
        .await
        .unwrap();

    assert_eq!(outcome.text, "21°C and 40% humidity at KBOS.");
    assert_eq!(outcome.model_calls, 3);
    assert_eq!(outcome.transcript.len(), 6);
    assert!(outcome.transcript.is_well_paired());
    assert_eq!(state.lookups.load(Ordering::SeqCst), 2);
    assert_eq!(outcome.executions[0].result["unit"], "celsius");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
    let last: Value = requests[2].body_json().unwrap();
    let names: Vec<_> = last["tools"][0]["functionDeclarations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["get_humidity", "get_temperature"]);
    assert_eq!(last["contents"].as_array().unwrap().len(), 5);
    assert_eq!(
        last["contents"][4]["parts"][0]["functionResponse"],
        json!({"name": "get_humidity", "response": {"station": "KBOS", "humidity": 40}})
    );
}
