//! Weather Conversation Example
//!
//! Asks Gemini on Vertex AI about the weather in Boston, resolves the
//! `get_current_weather` call it makes with a local stub, and prints the
//! model's final answer.
//!
//! # Running
//!
//! ```bash
//! GOOGLE_CLOUD_PROJECT=my-project cargo run --example weather_conversation
//! ```
//!
//! # Prerequisites
//!
//! - `GOOGLE_CLOUD_PROJECT` names a project with the Vertex AI API enabled.
//! - Application Default Credentials are configured
//!   (`gcloud auth application-default login`), or `GOOGLE_CLOUD_ACCESS_TOKEN`
//!   holds a bearer token.
//!
//! Set `RUST_LOG=vertex_genai=debug` to follow the conversation, or
//! `LOUD_WIRE=1` to see the raw request and response bodies.

use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use vertex_genai::{
    Client, Conversation, DEFAULT_REQUEST_TIMEOUT, FunctionRegistry, VertexConfig, VertexError,
    WeatherTool,
};

const PROMPT: &str = "What is the weather like in Boston?";

async fn run() -> Result<String, VertexError> {
    let config = VertexConfig::from_env()?;
    let client = Client::builder(config).build()?;

    let registry = FunctionRegistry::new().with_handler(WeatherTool);
    let outcome = Conversation::new(client, registry)
        .with_request_timeout(DEFAULT_REQUEST_TIMEOUT)
        .run(PROMPT)
        .await?;

    for execution in &outcome.executions {
        info!(
            "{}({}) -> {} in {:?}",
            execution.name, execution.args, execution.result, execution.duration
        );
    }

    Ok(outcome.text)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(text) => {
            println!("{text}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
