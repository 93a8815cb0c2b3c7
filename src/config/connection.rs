//! Data-source connection credentials.
//!
//! Supports configuration via environment variables:
//! - `NEURONLINK_SOURCE_URL`: Base URL of the data source
//! - `NEURONLINK_SOURCE_KEY`: API key (sent as `apikey` and bearer token)

use std::env;

/// Error type for connection configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid source URL: {0}")]
    InvalidUrl(String),
}

/// Credentials for a PostgREST-style data source.
#[derive(Debug, Clone)]
pub struct SourceCredentials {
    /// Base URL (with or without the `/rest/v1` suffix).
    pub url: String,
    /// Anonymous/service API key.
    pub anon_key: String,
}

impl SourceCredentials {
    /// Create credentials from explicit values.
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: anon_key.into(),
        }
    }

    /// Load credentials from environment variables.
    ///
    /// Required:
    /// - `NEURONLINK_SOURCE_URL`
    /// - `NEURONLINK_SOURCE_KEY`
    pub fn from_env() -> Result<Self, ConnectionError> {
        let url = env::var("NEURONLINK_SOURCE_URL")
            .map_err(|_| ConnectionError::MissingEnvVar("NEURONLINK_SOURCE_URL".to_string()))?;
        let anon_key = env::var("NEURONLINK_SOURCE_KEY")
            .map_err(|_| ConnectionError::MissingEnvVar("NEURONLINK_SOURCE_KEY".to_string()))?;
        if url.trim().is_empty() {
            return Err(ConnectionError::InvalidUrl("empty URL".to_string()));
        }
        Ok(Self { url, anon_key })
    }

    /// The REST API base, normalized to end in `/rest/v1` without a
    /// trailing slash. The suffix is appended only when not already
    /// present in the configured URL.
    pub fn rest_base(&self) -> String {
        let trimmed = self.url.trim_end_matches('/');
        if trimmed.contains("/rest/v1") {
            trimmed.to_string()
        } else {
            format!("{}/rest/v1", trimmed)
        }
    }
}
