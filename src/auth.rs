//! Authentication headers for Vertex AI requests.

use std::env;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use google_cloud_auth::credentials::{self, CacheableResource, Credentials};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use tracing::debug;

use crate::errors::VertexError;

/// OAuth scope required by Vertex AI.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// When set, its value is used as a bearer token instead of Application Default Credentials.
pub const ACCESS_TOKEN_ENV_VAR: &str = "GOOGLE_CLOUD_ACCESS_TOKEN";

/// Supplies the headers that authenticate a single request.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Returns headers to attach to the next request.
    async fn headers(&self) -> Result<HeaderMap, VertexError>;
}

/// Application Default Credentials via `google-cloud-auth`.
///
/// The credentials object refreshes tokens itself; the last headers it handed
/// out are kept so a `NotModified` answer can be served from the cache.
pub struct AdcAuthenticator {
    credentials: Credentials,
    cached: RwLock<Option<HeaderMap>>,
}

impl AdcAuthenticator {
    /// Builds ADC credentials scoped to `cloud-platform`.
    ///
    /// # Errors
    ///
    /// Returns [`VertexError::Auth`] if no usable credentials are found.
    pub fn new() -> Result<Self, VertexError> {
        let credentials = credentials::Builder::default()
            .with_scopes([CLOUD_PLATFORM_SCOPE])
            .build()
            .map_err(|e| VertexError::Auth(format!("failed to build ADC credentials: {e}")))?;
        Ok(Self::with_credentials(credentials))
    }

    #[must_use]
    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            credentials,
            cached: RwLock::new(None),
        }
    }
}

impl std::fmt::Debug for AdcAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdcAuthenticator").finish_non_exhaustive()
    }
}

#[async_trait]
impl Authenticator for AdcAuthenticator {
    async fn headers(&self) -> Result<HeaderMap, VertexError> {
        let resource = self
            .credentials
            .headers(Default::default())
            .await
            .map_err(|e| VertexError::Auth(format!("failed to obtain auth headers: {e}")))?;

        match resource {
            CacheableResource::New { data, .. } => {
                debug!("Obtained fresh ADC auth headers");
                *self.cached.write().unwrap_or_else(PoisonError::into_inner) = Some(data.clone());
                Ok(data)
            }
            CacheableResource::NotModified => self
                .cached
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
                .ok_or_else(|| {
                    VertexError::Auth(
                        "credentials returned NotModified before any headers were cached"
                            .to_string(),
                    )
                }),
        }
    }
}

/// A fixed bearer token, e.g. the output of `gcloud auth print-access-token`.
#[derive(Clone)]
pub struct StaticTokenAuthenticator {
    header: HeaderValue,
}

impl StaticTokenAuthenticator {
    /// # Errors
    ///
    /// Returns [`VertexError::Auth`] if the token is empty or not a valid header value.
    pub fn new(token: &str) -> Result<Self, VertexError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(VertexError::Auth("access token is empty".to_string()));
        }
        let mut header = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| VertexError::Auth(format!("invalid access token: {e}")))?;
        header.set_sensitive(true);
        Ok(Self { header })
    }
}

impl std::fmt::Debug for StaticTokenAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenAuthenticator")
            .field("header", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl Authenticator for StaticTokenAuthenticator {
    async fn headers(&self) -> Result<HeaderMap, VertexError> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, self.header.clone());
        Ok(headers)
    }
}

/// Sends requests without credentials. Only useful against local test servers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

#[async_trait]
impl Authenticator for NoAuth {
    async fn headers(&self) -> Result<HeaderMap, VertexError> {
        Ok(HeaderMap::new())
    }
}

/// Picks a static token from `GOOGLE_CLOUD_ACCESS_TOKEN` if set, otherwise ADC.
///
/// # Errors
///
/// Returns [`VertexError::Auth`] if the chosen source cannot be initialised.
pub fn authenticator_from_env() -> Result<Arc<dyn Authenticator>, VertexError> {
    match env::var(ACCESS_TOKEN_ENV_VAR) {
        Ok(token) if !token.trim().is_empty() => {
            debug!("Using static access token from {}", ACCESS_TOKEN_ENV_VAR);
            Ok(Arc::new(StaticTokenAuthenticator::new(&token)?))
        }
        _ => {
            debug!("Using Application Default Credentials");
            Ok(Arc::new(AdcAuthenticator::new()?))
        }
    }
}
