//! The function-calling conversation loop.
//!
//! [`Conversation::run`] seeds a transcript with the user's prompt and keeps
//! calling the model until it answers with text. Each function call the model
//! makes is resolved through the [`FunctionRegistry`] and its result appended
//! to the transcript before the next call:
//!
//! ```text
//! AwaitingModel --text--------------> HaveText --> Done
//! AwaitingModel --function call-----> HaveFunctionCall --dispatched--> AwaitingModel
//! any remote, response, or dispatch failure -----------------------> Failed
//! ```
//!
//! [`Conversation::inspect`] makes a single call and reports what the model
//! asked for without resolving it.

use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::client::ModelBackend;
use crate::errors::VertexError;
use crate::function_calling::FunctionRegistry;
use crate::models::{
    Content, FunctionCall, GenerateContentRequest, GenerateContentResponse, Part, Role, Tool,
};

/// Where the driver is in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    AwaitingModel,
    HaveFunctionCall,
    HaveText,
    Done,
    Failed,
}

/// The ordered, append-only list of turns exchanged so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    turns: Vec<Content>,
}

impl Transcript {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A transcript holding a single user turn with `prompt`.
    #[must_use]
    pub fn with_user_prompt(prompt: impl Into<String>) -> Self {
        Self {
            turns: vec![Content::user_text(prompt)],
        }
    }

    pub fn push(&mut self, turn: Content) {
        self.turns.push(turn);
    }

    #[must_use]
    pub fn turns(&self) -> &[Content] {
        &self.turns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    #[must_use]
    pub fn last(&self) -> Option<&Content> {
        self.turns.last()
    }

    #[must_use]
    pub fn into_turns(self) -> Vec<Content> {
        self.turns
    }

    /// The function call in the last turn, if no response to it has been appended yet.
    #[must_use]
    pub fn unanswered_function_call(&self) -> Option<&FunctionCall> {
        self.turns
            .last()
            .filter(|turn| turn.role != Some(Role::Function))
            .and_then(Content::function_call)
    }

    /// Whether every function-call turn is followed by exactly one
    /// function-response turn naming the same function.
    #[must_use]
    pub fn is_well_paired(&self) -> bool {
        self.turns.iter().enumerate().all(|(i, turn)| {
            let Some(call) = turn.function_call() else {
                return true;
            };
            let answered = self
                .turns
                .get(i + 1)
                .and_then(Content::function_response_part)
                .is_some_and(|response| response.name == call.name);
            let answered_once = self
                .turns
                .get(i + 2)
                .is_none_or(|next| next.function_response_part().is_none());
            answered && answered_once
        })
    }
}

/// One resolved function call.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionExecution {
    pub name: String,
    pub args: Value,
    /// The handler's result, or `{"error": ...}` when a dispatch error was reported to the model.
    pub result: Value,
    pub duration: Duration,
}

/// The result of a conversation that ended with a text answer.
#[derive(Debug, Clone)]
pub struct ConversationOutcome {
    /// The model's final answer, unchanged.
    pub text: String,
    /// Every turn exchanged, ending with the model's text turn.
    pub transcript: Transcript,
    /// Number of remote model calls made.
    pub model_calls: usize,
    pub executions: Vec<FunctionExecution>,
}

/// What the model answered to the first request.
#[derive(Debug, Clone, PartialEq)]
pub enum FirstResponse {
    Text(String),
    FunctionCall(FunctionCall),
}

enum Step {
    Text(String),
    FunctionCall(FunctionCall),
}

/// Only the first part of the first candidate is considered.
fn classify(part: &Part) -> Result<Step, VertexError> {
    match part {
        Part::Text { text, .. } => Ok(Step::Text(text.clone())),
        Part::FunctionCall { function_call, .. } => {
            Ok(Step::FunctionCall(function_call.clone()))
        }
        Part::FunctionResponse { .. } => Err(VertexError::MalformedResponse(
            "model returned a function response part".to_string(),
        )),
        Part::Unknown(value) => Err(VertexError::MalformedResponse(format!(
            "first part is neither text nor a function call: {value}"
        ))),
    }
}

fn first_content(response: &GenerateContentResponse) -> Result<Content, VertexError> {
    let mut content = response.first_candidate_content()?.clone();
    if content.role.is_none() {
        content.role = Some(Role::Model);
    }
    Ok(content)
}

fn transition(state: &mut DriverState, next: DriverState) {
    debug!("Driver state: {:?} -> {:?}", state, next);
    *state = next;
}

/// Drives a function-calling conversation against a [`ModelBackend`].
///
/// # Example
///
/// ```no_run
/// use vertex_genai::{Client, Conversation, FunctionRegistry, VertexConfig, WeatherTool};
///
/// # async fn example() -> Result<(), vertex_genai::VertexError> {
/// let client = Client::builder(VertexConfig::from_env()?).build()?;
/// let registry = FunctionRegistry::new().with_handler(WeatherTool);
///
/// let outcome = Conversation::new(client, registry)
///     .run("What is the weather like in Boston?")
///     .await?;
/// println!("{}", outcome.text);
/// # Ok(())
/// # }
/// ```
pub struct Conversation<B> {
    backend: B,
    registry: FunctionRegistry,
    tools: Vec<Tool>,
    max_function_call_loops: Option<usize>,
    request_timeout: Option<Duration>,
    report_dispatch_errors: bool,
}

impl<B: ModelBackend> Conversation<B> {
    /// Creates a driver whose requests declare every function in `registry`.
    #[must_use]
    pub fn new(backend: B, registry: FunctionRegistry) -> Self {
        let tools = registry.tools();
        Self {
            backend,
            registry,
            tools,
            max_function_call_loops: None,
            request_timeout: None,
            report_dispatch_errors: false,
        }
    }

    /// Limits how many function calls one `run` may resolve. Unbounded by default.
    #[must_use]
    pub const fn with_max_function_call_loops(mut self, max: usize) -> Self {
        self.max_function_call_loops = Some(max);
        self
    }

    /// Applies a deadline to each remote call. Function execution is not counted.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// When enabled, dispatch failures are sent to the model as
    /// `{"error": ...}` function responses instead of ending the run.
    #[must_use]
    pub const fn with_report_dispatch_errors(mut self, enabled: bool) -> Self {
        self.report_dispatch_errors = enabled;
        self
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[must_use]
    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    async fn call_model(
        &self,
        transcript: &Transcript,
    ) -> Result<GenerateContentResponse, VertexError> {
        let request = GenerateContentRequest {
            contents: transcript.turns().to_vec(),
            tools: self.tools.clone(),
        };

        match self.request_timeout {
            Some(duration) => tokio::time::timeout(duration, self.backend.generate_content(&request))
                .await
                .map_err(|_| {
                    warn!("Model call timed out after {:?}", duration);
                    VertexError::Timeout(duration)
                })?,
            None => self.backend.generate_content(&request).await,
        }
    }

    /// Runs the conversation until the model answers with text.
    ///
    /// # Errors
    ///
    /// Returns an error if a remote call fails or times out, a response has no
    /// usable candidate or its first part is neither text nor a function call,
    /// a function call cannot be dispatched (unless dispatch errors are
    /// reported to the model), or the loop limit is reached.
    pub async fn run(&self, prompt: &str) -> Result<ConversationOutcome, VertexError> {
        let mut transcript = Transcript::with_user_prompt(prompt);
        let mut executions = Vec::new();
        let mut model_calls = 0;
        let mut state = DriverState::AwaitingModel;

        let result = loop {
            debug_assert!(transcript.unanswered_function_call().is_none());

            let response = match self.call_model(&transcript).await {
                Ok(response) => response,
                Err(e) => break Err(e),
            };
            model_calls += 1;

            let step = first_content(&response)
                .and_then(|content| classify(&content.parts[0]).map(|step| (content, step)));
            let (content, step) = match step {
                Ok(pair) => pair,
                Err(e) => break Err(e),
            };

            match step {
                Step::Text(text) => {
                    transition(&mut state, DriverState::HaveText);
                    transcript.push(content);
                    break Ok(text);
                }
                Step::FunctionCall(call) => {
                    transition(&mut state, DriverState::HaveFunctionCall);
                    if let Some(max) = self.max_function_call_loops
                        && executions.len() >= max
                    {
                        break Err(VertexError::MaxLoopsExceeded(max));
                    }
                    transcript.push(content);

                    let started = Instant::now();
                    let response_turn = match self.registry.dispatch(&call).await {
                        Ok(turn) => turn,
                        Err(e) if self.report_dispatch_errors => {
                            warn!(
                                "Function dispatch failed (recoverable): function='{}', error='{}'. \
                                 The error will be sent to the model.",
                                call.name, e
                            );
                            e.to_response_content(&call.name)
                        }
                        Err(e) => break Err(e.into()),
                    };
                    let duration = started.elapsed();
                    debug!("Function '{}' resolved in {:?}", call.name, duration);

                    let result = response_turn
                        .function_response_part()
                        .map(|r| r.response.clone())
                        .unwrap_or(Value::Null);
                    transcript.push(response_turn);
                    executions.push(FunctionExecution {
                        name: call.name,
                        args: call.args,
                        result,
                        duration,
                    });
                    transition(&mut state, DriverState::AwaitingModel);
                }
            }
        };

        match result {
            Ok(text) => {
                transition(&mut state, DriverState::Done);
                info!(
                    "Conversation finished after {} model call(s) and {} function call(s)",
                    model_calls,
                    executions.len()
                );
                Ok(ConversationOutcome {
                    text,
                    transcript,
                    model_calls,
                    executions,
                })
            }
            Err(e) => {
                transition(&mut state, DriverState::Failed);
                warn!("Conversation failed after {} model call(s): {}", model_calls, e);
                Err(e)
            }
        }
    }

    /// Sends `prompt` once and reports the first part of the answer without
    /// resolving any function call.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote call fails or the response has no usable
    /// first part.
    pub async fn inspect(&self, prompt: &str) -> Result<FirstResponse, VertexError> {
        let transcript = Transcript::with_user_prompt(prompt);
        let response = self.call_model(&transcript).await?;
        let content = first_content(&response)?;

        match classify(&content.parts[0])? {
            Step::Text(text) => Ok(FirstResponse::Text(text)),
            Step::FunctionCall(call) => {
                debug!(
                    "Model requested function '{}' with args {}",
                    call.name, call.args
                );
                Ok(FirstResponse::FunctionCall(call))
            }
        }
    }
}
