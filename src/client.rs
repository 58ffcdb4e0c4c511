use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use tracing::debug;

use crate::auth::{Authenticator, authenticator_from_env};
use crate::config::VertexConfig;
use crate::errors::VertexError;
use crate::http;
use crate::models::{GenerateContentRequest, GenerateContentResponse};

/// Anything that can answer a `generateContent` request.
///
/// [`Client`] talks to Vertex AI; tests substitute scripted backends.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Sends the transcript and tool declarations, returning the model's candidates.
    async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, VertexError>;
}

/// Client for the Vertex AI `generateContent` endpoint of one publisher model.
///
/// The HTTP connection pool and credentials are acquired once here and released
/// when the client is dropped.
#[derive(Clone)]
pub struct Client {
    config: VertexConfig,
    #[allow(clippy::struct_field_names)]
    http_client: ReqwestClient,
    authenticator: Arc<dyn Authenticator>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builder for `Client` instances.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use vertex_genai::{Client, NoAuth, VertexConfig};
///
/// let client = Client::builder(VertexConfig::new("my-project"))
///     .authenticator(Arc::new(NoAuth))
///     .timeout(Duration::from_secs(120))
///     .connect_timeout(Duration::from_secs(10))
///     .build()
///     .expect("client should build");
/// assert_eq!(client.config().project_id(), "my-project");
/// ```
pub struct ClientBuilder {
    config: VertexConfig,
    authenticator: Option<Arc<dyn Authenticator>>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
}

impl ClientBuilder {
    /// Sets the source of authentication headers.
    ///
    /// If not set, [`authenticator_from_env`] picks one at build time.
    #[must_use]
    pub fn authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    /// Sets the total HTTP request timeout, enforced by the transport.
    ///
    /// If not set, uses reqwest's default (no timeout).
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Builds the `Client`.
    ///
    /// # Errors
    ///
    /// Returns [`VertexError::ClientBuild`] if the HTTP client cannot be built,
    /// or [`VertexError::Auth`] if no authenticator was given and none can be
    /// initialised from the environment.
    pub fn build(self) -> Result<Client, VertexError> {
        let mut builder = ReqwestClient::builder();

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(connect_timeout) = self.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }

        let http_client = builder
            .build()
            .map_err(|e| VertexError::ClientBuild(e.to_string()))?;

        let authenticator = match self.authenticator {
            Some(authenticator) => authenticator,
            None => authenticator_from_env()?,
        };

        debug!(
            "Built Vertex AI client for {}",
            self.config.model_resource()
        );

        Ok(Client {
            config: self.config,
            http_client,
            authenticator,
        })
    }
}

impl Client {
    /// Creates a new builder for `Client` instances.
    #[must_use]
    pub fn builder(config: VertexConfig) -> ClientBuilder {
        ClientBuilder {
            config,
            authenticator: None,
            timeout: None,
            connect_timeout: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &VertexConfig {
        &self.config
    }
}

#[async_trait]
impl ModelBackend for Client {
    async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, VertexError> {
        let auth_headers = self.authenticator.headers().await?;
        let response =
            http::generate::generate_content(&self.http_client, &self.config, auth_headers, request)
                .await?;

        if let Some(usage) = &response.usage_metadata {
            debug!(
                "Token usage: prompt={:?}, candidates={:?}, total={:?}",
                usage.prompt_token_count, usage.candidates_token_count, usage.total_token_count
            );
        }

        Ok(response)
    }
}
