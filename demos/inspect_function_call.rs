//! Inspect Function Call Example
//!
//! Sends the weather question once and prints what the model asked for,
//! without running the function or continuing the conversation.
//!
//! # Running
//!
//! ```bash
//! GOOGLE_CLOUD_PROJECT=my-project cargo run --example inspect_function_call
//! ```
//!
//! Credentials are resolved the same way as in `weather_conversation`.

use std::process::ExitCode;

use tracing::error;
use tracing_subscriber::EnvFilter;
use vertex_genai::{
    Client, Conversation, DEFAULT_REQUEST_TIMEOUT, FirstResponse, FunctionRegistry, VertexConfig,
    VertexError, WeatherTool,
};

const PROMPT: &str = "What is the weather like in Boston?";

async fn run() -> Result<FirstResponse, VertexError> {
    let config = VertexConfig::from_env()?;
    let client = Client::builder(config).build()?;

    let registry = FunctionRegistry::new().with_handler(WeatherTool);
    Conversation::new(client, registry)
        .with_request_timeout(DEFAULT_REQUEST_TIMEOUT)
        .inspect(PROMPT)
        .await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(FirstResponse::FunctionCall(call)) => {
            println!("{}({})", call.name, call.args);
            ExitCode::SUCCESS
        }
        Ok(FirstResponse::Text(text)) => {
            println!("{text}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
