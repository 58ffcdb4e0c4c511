use reqwest::Client as ReqwestClient;
use reqwest::header::HeaderMap;
use tracing::{debug, warn};

use super::common::{Endpoint, construct_endpoint_url};
use super::error_helpers::{check_response, deserialize_with_context};
use super::loud_wire;
use crate::config::VertexConfig;
use crate::errors::VertexError;
use crate::models::{GenerateContentRequest, GenerateContentResponse};

/// Sends a `generateContent` request for the configured model.
///
/// # Errors
///
/// Returns an error if:
/// - The HTTP request fails
/// - The response status is not successful
/// - The response cannot be parsed as JSON
pub async fn generate_content(
    http_client: &ReqwestClient,
    config: &VertexConfig,
    auth_headers: HeaderMap,
    request: &GenerateContentRequest,
) -> Result<GenerateContentResponse, VertexError> {
    let url = construct_endpoint_url(config, Endpoint::GenerateContent);

    let request_id = loud_wire::next_request_id();
    if loud_wire::is_enabled() {
        match serde_json::to_string(request) {
            Ok(body) => loud_wire::log_request(request_id, "POST", &url, Some(&body)),
            Err(e) => {
                warn!("LOUD_WIRE: Failed to serialize request body: {}", e);
                loud_wire::log_request(request_id, "POST", &url, None);
            }
        }
    }

    debug!(
        "POST {} with {} turn(s), {} tool(s)",
        url,
        request.contents.len(),
        request.tools.len()
    );

    let response = http_client
        .post(&url)
        .headers(auth_headers)
        .json(request)
        .send()
        .await?;

    loud_wire::log_response_status(request_id, response.status().as_u16());

    let response = check_response(response).await?;
    let response_text = response.text().await?;

    loud_wire::log_response_body(request_id, &response_text);

    deserialize_with_context(&response_text, "GenerateContentResponse")
}
