//! Error types for the legacy configuration service client.

use thiserror::Error;

/// Result type for legacy configuration service operations.
pub type ConfigClientResult<T> = Result<T, ConfigClientError>;

/// Errors returned by [`crate::LegacyConfigClient`].
#[derive(Debug, Error)]
pub enum ConfigClientError {
    /// The service answered with a non-success status.
    #[error("Configuration service returned status {status}")]
    UpstreamStatus {
        /// HTTP status code reported by the service.
        status: u16,
    },

    /// Transport-level failure (connect, timeout, TLS).
    #[error("Configuration service request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body did not match the expected envelope.
    #[error("Invalid response from configuration service: {0}")]
    InvalidResponse(String),

    /// Client was constructed with unusable parameters.
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for ConfigClientError {
    fn from(e: serde_json::Error) -> Self {
        ConfigClientError::InvalidResponse(e.to_string())
    }
}
