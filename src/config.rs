//! Process configuration: which project, region, and model to talk to.

use std::env;
use std::time::Duration;

use crate::errors::VertexError;

/// Environment variable naming the Google Cloud project that hosts the model.
pub const PROJECT_ENV_VAR: &str = "GOOGLE_CLOUD_PROJECT";

/// Region the demos run against.
pub const DEFAULT_LOCATION: &str = "us-central1";

/// Model the demos run against.
pub const DEFAULT_MODEL_ID: &str = "gemini-1.5-flash-001";

/// Vertex AI REST API version used for `generateContent`.
pub const API_VERSION: &str = "v1beta1";

/// Per-call deadline the demos pass to `Conversation::with_request_timeout`.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Where and what to call on Vertex AI.
///
/// # Example
///
/// ```
/// use vertex_genai::VertexConfig;
///
/// let config = VertexConfig::new("my-project");
/// assert_eq!(
///     config.model_resource(),
///     "projects/my-project/locations/us-central1/publishers/google/models/gemini-1.5-flash-001"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexConfig {
    project_id: String,
    location: String,
    model_id: String,
    endpoint: Option<String>,
}

impl VertexConfig {
    /// Creates a configuration for `project_id` with the default region and model.
    #[must_use]
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            location: DEFAULT_LOCATION.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            endpoint: None,
        }
    }

    /// Reads the project from `GOOGLE_CLOUD_PROJECT`.
    ///
    /// # Errors
    ///
    /// Returns [`VertexError::Config`] if the variable is unset or blank.
    pub fn from_env() -> Result<Self, VertexError> {
        Self::from_project_value(env::var(PROJECT_ENV_VAR).ok())
    }

    fn from_project_value(value: Option<String>) -> Result<Self, VertexError> {
        match value {
            Some(project) if !project.trim().is_empty() => Ok(Self::new(project.trim())),
            _ => Err(VertexError::Config(format!(
                "{PROJECT_ENV_VAR} environment variable must be set"
            ))),
        }
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    #[must_use]
    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    /// Overrides the service endpoint, e.g. to point at a local mock server.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    #[must_use]
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// The regional endpoint, or the override if one was set. Never ends with `/`.
    #[must_use]
    pub fn endpoint(&self) -> String {
        let endpoint = self
            .endpoint
            .clone()
            .unwrap_or_else(|| format!("https://{}-aiplatform.googleapis.com", self.location));
        endpoint.trim_end_matches('/').to_string()
    }

    /// Fully-qualified publisher model name.
    #[must_use]
    pub fn model_resource(&self) -> String {
        format!(
            "projects/{}/locations/{}/publishers/google/models/{}",
            self.project_id, self.location, self.model_id
        )
    }
}
