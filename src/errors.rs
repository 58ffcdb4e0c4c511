use std::time::Duration;

use thiserror::Error;

use crate::function_calling::DispatchError;

/// Defines errors that can occur while driving a function-calling conversation
/// against Vertex AI.
///
/// # Example: Handling API Errors
///
/// ```ignore
/// match conversation.run("What is the weather like in Boston?").await {
///     Err(VertexError::Api { status_code: 429, request_id, .. }) => {
///         tracing::warn!("Rate limited, request_id: {:?}", request_id);
///     }
///     Err(VertexError::Dispatch(e)) => {
///         tracing::error!("Tool dispatch failed: {}", e);
///     }
///     // ...
/// }
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VertexError {
    /// A required configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    /// API error with structured context for debugging and automated handling.
    ///
    /// Contains the HTTP status code, error message, and optional request ID
    /// (for correlation with Google API logs/support).
    #[error("API error (HTTP {status_code}): {message}")]
    Api {
        /// HTTP status code (e.g., 400, 429, 500)
        status_code: u16,
        /// Error message from the API response body
        message: String,
        /// Request ID from `x-goog-request-id` header, if available
        request_id: Option<String>,
    },
    /// Obtaining authentication headers failed.
    #[error("Authentication error: {0}")]
    Auth(String),
    /// The API returned a successful response whose content the driver cannot act on:
    /// no candidates, no parts, or a part that is neither text nor a function call.
    #[error("Malformed API response: {0}")]
    MalformedResponse(String),
    /// A remote call exceeded its per-call deadline.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
    /// Resolving a function call locally failed.
    #[error("Function dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
    /// The configured limit on function-calling rounds was reached before the
    /// model produced a text answer.
    #[error("Exceeded maximum function call loops ({0}) without a text response")]
    MaxLoopsExceeded(usize),
}

impl VertexError {
    /// Returns `true` if this error is likely transient and the request may succeed on retry.
    ///
    /// The crate never retries on its own; this is for callers that want to.
    ///
    /// ```rust
    /// use vertex_genai::VertexError;
    /// use std::time::Duration;
    ///
    /// let rate_limited = VertexError::Api {
    ///     status_code: 429,
    ///     message: "Resource exhausted".to_string(),
    ///     request_id: None,
    /// };
    /// assert!(rate_limited.is_retryable());
    ///
    /// assert!(VertexError::Timeout(Duration::from_secs(30)).is_retryable());
    /// assert!(!VertexError::Config("GOOGLE_CLOUD_PROJECT".into()).is_retryable());
    /// ```
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            VertexError::Http(_) => true,
            VertexError::Api { status_code, .. } => *status_code == 429 || *status_code >= 500,
            VertexError::Timeout(_) => true,
            VertexError::Config(_)
            | VertexError::Json(_)
            | VertexError::Auth(_)
            | VertexError::MalformedResponse(_)
            | VertexError::ClientBuild(_)
            | VertexError::Dispatch(_)
            | VertexError::MaxLoopsExceeded(_) => false,
        }
    }
}
