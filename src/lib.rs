//! Gemini function calling on Vertex AI.
//!
//! The crate sends a prompt to a Gemini model hosted on Vertex AI together
//! with a set of function declarations, runs whatever functions the model asks
//! for, feeds the results back, and returns the model's final text.
//!
//! - [`Client`] talks to the `generateContent` endpoint of one model.
//! - [`FunctionRegistry`] maps function names to handlers and produces the
//!   declarations sent with every request.
//! - [`Conversation`] drives the call/dispatch loop over any [`ModelBackend`].
//! - [`WeatherTool`] is a constant-data `get_current_weather` stub.
//!
//! # Example
//!
//! ```no_run
//! use vertex_genai::{
//!     Client, Conversation, DEFAULT_REQUEST_TIMEOUT, FunctionRegistry, VertexConfig, WeatherTool,
//! };
//!
//! # async fn example() -> Result<(), vertex_genai::VertexError> {
//! let client = Client::builder(VertexConfig::from_env()?).build()?;
//!
//! let conversation = Conversation::new(client, FunctionRegistry::new().with_handler(WeatherTool))
//!     .with_request_timeout(DEFAULT_REQUEST_TIMEOUT);
//! let outcome = conversation.run("What is the weather like in Boston?").await?;
//! println!("{}", outcome.text);
//! # Ok(())
//! # }
//! ```
//!
//! Set `LOUD_WIRE=1` to print every request and response body to stderr.

mod auth;
mod client;
mod config;
mod conversation;
mod errors;
mod function_calling;
mod http;
mod models;
mod weather;

pub use auth::{
    ACCESS_TOKEN_ENV_VAR, AdcAuthenticator, Authenticator, CLOUD_PLATFORM_SCOPE, NoAuth,
    StaticTokenAuthenticator, authenticator_from_env,
};
pub use client::{Client, ClientBuilder, ModelBackend};
pub use config::{
    API_VERSION, DEFAULT_LOCATION, DEFAULT_MODEL_ID, DEFAULT_REQUEST_TIMEOUT, PROJECT_ENV_VAR,
    VertexConfig,
};
pub use conversation::{
    Conversation, ConversationOutcome, DriverState, FirstResponse, FunctionExecution, Transcript,
};
pub use errors::VertexError;
pub use function_calling::{
    CallableFunction, DispatchError, FunctionError, FunctionRegistry, ToolHandler, ToolService,
    validate_args,
};
pub use models::{
    Candidate, Content, FunctionCall, FunctionDeclaration, FunctionDeclarationBuilder,
    FunctionParameters, FunctionResponse, GenerateContentRequest, GenerateContentResponse, Part,
    Role, Tool, UsageMetadata,
};
pub use weather::{
    GET_CURRENT_WEATHER, WeatherArgs, WeatherReport, WeatherTool, get_current_weather,
    weather_declaration,
};
