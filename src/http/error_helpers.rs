//! Error handling utilities for HTTP responses and error context formatting.

use reqwest::Response;
use serde::de::DeserializeOwned;

use super::common::REQUEST_ID_HEADER;
use crate::errors::VertexError;

/// Maximum characters to include from a body in error messages.
const ERROR_BODY_PREVIEW_LENGTH: usize = 200;

/// Returns the response if its status is successful, otherwise an [`VertexError::Api`].
///
/// # Errors
///
/// Returns an error with status code, body preview, and request ID on non-success status.
pub async fn check_response(response: Response) -> Result<Response, VertexError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(read_error_with_context(response).await)
    }
}

/// Reads an error response into a structured [`VertexError::Api`].
///
/// If the body cannot be read, the message describes the read failure.
pub async fn read_error_with_context(response: Response) -> VertexError {
    let status_code = response.status().as_u16();

    // Headers must be read before the body consumes the response
    let request_id = response
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let error_body = response
        .text()
        .await
        .unwrap_or_else(|e| format!("Failed to read error body: {}", e));

    let message = if error_body.trim().is_empty() {
        "<empty body>".to_string()
    } else {
        truncate_for_context(&error_body, ERROR_BODY_PREVIEW_LENGTH)
    };

    VertexError::Api {
        status_code,
        message,
        request_id,
    }
}

/// Deserializes a response body, logging a preview of the body on failure.
///
/// # Errors
///
/// Returns [`VertexError::Json`] if the body does not match `T`.
pub fn deserialize_with_context<T: DeserializeOwned>(
    body: &str,
    type_name: &str,
) -> Result<T, VertexError> {
    serde_json::from_str(body).map_err(|e| {
        tracing::error!(
            "Failed to deserialize {}: {}",
            type_name,
            format_json_parse_error(body, &e)
        );
        VertexError::Json(e)
    })
}

/// Formats a JSON parse error with a preview of the offending body.
pub fn format_json_parse_error(json_str: &str, error: &serde_json::Error) -> String {
    let preview = truncate_for_context(json_str, ERROR_BODY_PREVIEW_LENGTH);
    format!("JSON parse error: {} | Context: {}", error, preview)
}

/// Truncates a string to at most `max_len` bytes plus "...", on a char boundary.
pub(crate) fn truncate_for_context(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let truncate_at = s
            .char_indices()
            .take_while(|(i, c)| i + c.len_utf8() <= max_len)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}...", &s[..truncate_at])
    }
}
