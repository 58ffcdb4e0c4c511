//! Local resolution of model-issued function calls.
//!
//! A [`FunctionRegistry`] maps function names to [`CallableFunction`] handlers.
//! It is built once at startup and handed to the conversation driver, which
//! calls [`FunctionRegistry::dispatch`] for every function call the model makes.
//!
//! Most tools implement the typed [`ToolHandler`] trait; the registry adapts
//! them so that arguments are validated against the declared schema and
//! decoded before the handler runs, and the handler's output is encoded back
//! to JSON afterwards.

use std::collections::BTreeMap;
use std::error::Error;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{Content, FunctionCall, FunctionDeclaration, FunctionParameters, Tool};

/// Represents an error that can occur during function execution.
///
/// This enum is marked `#[non_exhaustive]` for forward compatibility.
#[derive(Debug)]
#[non_exhaustive]
pub enum FunctionError {
    ArgumentMismatch(String),
    ExecutionError(Box<dyn Error + Send + Sync>),
}

impl std::fmt::Display for FunctionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ArgumentMismatch(msg) => write!(f, "Argument mismatch: {msg}"),
            Self::ExecutionError(err) => write!(f, "Function execution error: {err}"),
        }
    }
}

impl Error for FunctionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ExecutionError(err) => Some(err.as_ref()),
            Self::ArgumentMismatch(_) => None,
        }
    }
}

/// Errors produced while dispatching a function call.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DispatchError {
    /// No handler is registered under the requested name.
    #[error("Unknown function: '{0}'")]
    UnknownFunction(String),
    /// The arguments did not match the declared schema or could not be decoded.
    #[error("Invalid arguments for '{name}': {message}")]
    InvalidArguments { name: String, message: String },
    /// The handler ran and failed.
    #[error("Function '{name}' failed: {source}")]
    Execution {
        name: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl DispatchError {
    fn from_function_error(name: &str, error: FunctionError) -> Self {
        match error {
            FunctionError::ArgumentMismatch(message) => Self::InvalidArguments {
                name: name.to_string(),
                message,
            },
            FunctionError::ExecutionError(source) => Self::Execution {
                name: name.to_string(),
                source,
            },
        }
    }

    /// Encodes this error as a function-response turn, so it can be reported to
    /// the model instead of ending the conversation.
    #[must_use]
    pub fn to_response_content(&self, function_name: &str) -> Content {
        Content::function_response(function_name, json!({ "error": self.to_string() }))
    }
}

/// A function the model can call, operating on raw JSON.
#[async_trait]
pub trait CallableFunction: Send + Sync {
    /// Returns the declaration of the function.
    fn declaration(&self) -> FunctionDeclaration;

    /// Executes the function with the given arguments.
    async fn call(&self, args: Value) -> Result<Value, FunctionError>;
}

/// A strongly typed tool: arguments are decoded into `Args` and the result is
/// encoded from `Output`.
///
/// Register implementations with [`FunctionRegistry::register_handler`].
#[async_trait]
pub trait ToolHandler: Send + Sync {
    type Args: DeserializeOwned + Send;
    type Output: Serialize + Send;

    fn declaration(&self) -> FunctionDeclaration;

    async fn invoke(&self, args: Self::Args) -> Result<Self::Output, FunctionError>;
}

/// Adapts a [`ToolHandler`] into a [`CallableFunction`]: validate, decode, invoke, encode.
struct HandlerAdapter<H> {
    handler: H,
    declaration: FunctionDeclaration,
}

#[async_trait]
impl<H: ToolHandler> CallableFunction for HandlerAdapter<H> {
    fn declaration(&self) -> FunctionDeclaration {
        self.declaration.clone()
    }

    async fn call(&self, args: Value) -> Result<Value, FunctionError> {
        validate_args(self.declaration.parameters(), &args)?;
        let decoded: H::Args = serde_json::from_value(args)
            .map_err(|e| FunctionError::ArgumentMismatch(e.to_string()))?;
        let output = self.handler.invoke(decoded).await?;
        serde_json::to_value(output).map_err(|e| FunctionError::ExecutionError(Box::new(e)))
    }
}

/// Checks raw arguments against a parameter schema.
///
/// The payload must be an object, every required key must be present and
/// non-null, and values for declared properties with a scalar `type` must
/// have that JSON type. Keys not in the schema are left alone.
///
/// # Errors
///
/// Returns [`FunctionError::ArgumentMismatch`] describing the first violation.
pub fn validate_args(parameters: &FunctionParameters, args: &Value) -> Result<(), FunctionError> {
    let Some(object) = args.as_object() else {
        return Err(FunctionError::ArgumentMismatch(format!(
            "arguments must be a JSON object, got {args}"
        )));
    };

    for key in parameters.required() {
        match object.get(key) {
            None | Some(Value::Null) => {
                return Err(FunctionError::ArgumentMismatch(format!(
                    "missing required argument '{key}'"
                )));
            }
            Some(_) => {}
        }
    }

    let Some(properties) = parameters.properties().as_object() else {
        return Ok(());
    };

    for (key, value) in object {
        if value.is_null() {
            continue;
        }
        let Some(expected) = properties
            .get(key)
            .and_then(|schema| schema.get("type"))
            .and_then(Value::as_str)
        else {
            continue;
        };
        if !matches_schema_type(expected, value) {
            return Err(FunctionError::ArgumentMismatch(format!(
                "argument '{key}' should be of type {expected}, got {value}"
            )));
        }
    }

    Ok(())
}

fn matches_schema_type(expected: &str, value: &Value) -> bool {
    match expected.to_ascii_lowercase().as_str() {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        _ => true,
    }
}

/// A provider of callable functions with shared state/dependencies.
///
/// Implement this on structs that hand the same resources (configuration,
/// clients) to several tools.
pub trait ToolService: Send + Sync {
    /// Returns the callable functions provided by this service.
    fn tools(&self) -> Vec<Arc<dyn CallableFunction>>;
}

/// An explicit mapping from function name to handler.
#[derive(Default, Clone)]
pub struct FunctionRegistry {
    functions: BTreeMap<String, Arc<dyn CallableFunction>>,
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FunctionRegistry {
    /// Creates a new empty function registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a function. A later registration under the same name replaces
    /// the earlier one.
    pub fn register(&mut self, function: Arc<dyn CallableFunction>) {
        let name = function.declaration().name().to_string();
        if self.functions.contains_key(&name) {
            warn!(
                "Duplicate function name in registry: function='{}'. Last registration will be used.",
                name
            );
        }
        self.functions.insert(name, function);
    }

    /// Registers a typed handler.
    pub fn register_handler<H: ToolHandler + 'static>(&mut self, handler: H) {
        let declaration = handler.declaration();
        self.register(Arc::new(HandlerAdapter {
            handler,
            declaration,
        }));
    }

    /// Registers every function a service provides.
    pub fn register_service(&mut self, service: &dyn ToolService) {
        for function in service.tools() {
            self.register(function);
        }
    }

    #[must_use]
    pub fn with_handler<H: ToolHandler + 'static>(mut self, handler: H) -> Self {
        self.register_handler(handler);
        self
    }

    #[must_use]
    pub fn with_function(mut self, function: Arc<dyn CallableFunction>) -> Self {
        self.register(function);
        self
    }

    /// Retrieves a function by its name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn CallableFunction> {
        self.functions.get(name).map(AsRef::as_ref)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Declarations of all registered functions, ordered by name.
    #[must_use]
    pub fn declarations(&self) -> Vec<FunctionDeclaration> {
        self.functions.values().map(|f| f.declaration()).collect()
    }

    /// The tool list sent with every request: one tool holding all declarations,
    /// or nothing when the registry is empty.
    #[must_use]
    pub fn tools(&self) -> Vec<Tool> {
        if self.functions.is_empty() {
            Vec::new()
        } else {
            vec![Tool {
                function_declarations: self.declarations(),
            }]
        }
    }

    /// Runs the handler named by `call` and returns its raw JSON result.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnknownFunction`] for unregistered names,
    /// [`DispatchError::InvalidArguments`] when the arguments fail validation
    /// or decoding, and [`DispatchError::Execution`] when the handler fails.
    pub async fn execute(&self, call: &FunctionCall) -> Result<Value, DispatchError> {
        let function = self
            .get(&call.name)
            .ok_or_else(|| DispatchError::UnknownFunction(call.name.clone()))?;

        debug!("Dispatching function call: name='{}'", call.name);
        function
            .call(call.args.clone())
            .await
            .map_err(|e| DispatchError::from_function_error(&call.name, e))
    }

    /// Resolves a function call into a function-response turn naming the same function.
    ///
    /// # Errors
    ///
    /// See [`FunctionRegistry::execute`].
    pub async fn dispatch(&self, call: &FunctionCall) -> Result<Content, DispatchError> {
        let result = self.execute(call).await?;
        Ok(Content::function_response(call.name.clone(), result))
    }
}
