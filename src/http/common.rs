use crate::config::{API_VERSION, VertexConfig};

/// Google's request ID response header.
///
/// Identifies each request uniquely; useful when contacting support or
/// correlating with server logs.
pub const REQUEST_ID_HEADER: &str = "x-goog-request-id";

/// Publisher model methods this crate calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Unary content generation.
    GenerateContent,
}

impl Endpoint {
    const fn method(self) -> &'static str {
        match self {
            Self::GenerateContent => "generateContent",
        }
    }
}

/// Constructs the URL of a publisher model method for the configured model.
#[must_use]
pub fn construct_endpoint_url(config: &VertexConfig, endpoint: Endpoint) -> String {
    format!(
        "{}/{}/{}:{}",
        config.endpoint(),
        API_VERSION,
        config.model_resource(),
        endpoint.method()
    )
}
