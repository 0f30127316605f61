//! SSO configuration error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fedgate_config_client::ConfigClientError;
use serde::Serialize;
use thiserror::Error;

/// Result type for SSO configuration operations
pub type SsoResult<T> = Result<T, SsoError>;

/// Errors raised by the configuration repository, migration coordinator,
/// client factory, and client registry.
#[derive(Debug, Error)]
pub enum SsoError {
    /// No configuration row exists for the tenant. Recoverable by migration
    /// or by an explicit configuration write; for end users this means
    /// "SSO not configured yet".
    #[error("No SSO configuration found for tenant")]
    ConfigNotFound,

    /// More than one configuration row exists for the tenant. This is a
    /// consistency violation that requires operator intervention; it is
    /// never resolved automatically.
    #[error("Ambiguous SSO configuration state: {count} rows found for tenant, expected at most 1")]
    AmbiguousConfigState {
        /// Number of rows found.
        count: usize,
    },

    /// A field update referenced a configuration code that is not part of
    /// the recognized vocabulary. No mutation is performed.
    #[error("Unsupported configuration code: {0}")]
    UnsupportedConfigCode(String),

    /// The legacy configuration service failed.
    #[error("Legacy configuration service error: {0}")]
    Upstream(#[from] ConfigClientError),

    /// Client construction requires an identity provider URL.
    #[error("IdP URL is not configured for tenant")]
    MissingIdpUrl,

    /// Client construction requires keystore material and generation was
    /// not permitted.
    #[error("Service provider keystore is not configured for tenant")]
    MissingKeyMaterial,

    /// Stored keystore material could not be decoded.
    #[error("Invalid keystore material: {0}")]
    InvalidKeystore(String),

    /// Temporary keystore file read/write/delete failure.
    #[error("Keystore file I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Local store failure.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Key material generation failure.
    #[error("Cryptographic operation failed: {0}")]
    Crypto(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<openssl::error::ErrorStack> for SsoError {
    fn from(e: openssl::error::ErrorStack) -> Self {
        SsoError::Crypto(e.to_string())
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for SsoError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            // Absence of configuration is a normal state, distinct from the
            // fatal consistency error below.
            SsoError::ConfigNotFound => (StatusCode::NOT_FOUND, "sso_not_configured"),
            SsoError::AmbiguousConfigState { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "config_state_ambiguous")
            }
            SsoError::UnsupportedConfigCode(_) => {
                (StatusCode::BAD_REQUEST, "unsupported_config_code")
            }
            SsoError::Upstream(_) => (StatusCode::BAD_GATEWAY, "config_service_unavailable"),
            SsoError::MissingIdpUrl => (StatusCode::CONFLICT, "idp_url_missing"),
            SsoError::MissingKeyMaterial => (StatusCode::CONFLICT, "keystore_missing"),
            SsoError::InvalidKeystore(_) => (StatusCode::CONFLICT, "keystore_invalid"),
            SsoError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "keystore_io_error"),
            SsoError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            SsoError::Crypto(_) => (StatusCode::INTERNAL_SERVER_ERROR, "crypto_error"),
            SsoError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let message = match &self {
            SsoError::Database(e) => {
                tracing::error!("SSO database error: {:?}", e);
                "A database error occurred".to_string()
            }
            SsoError::Io(e) => {
                tracing::error!("SSO keystore I/O error: {:?}", e);
                "A keystore I/O error occurred".to_string()
            }
            SsoError::Crypto(msg) => {
                tracing::error!("SSO cryptographic error: {}", msg);
                "A cryptographic error occurred".to_string()
            }
            SsoError::Internal(msg) => {
                tracing::error!("SSO internal error: {}", msg);
                "An internal error occurred".to_string()
            }
            SsoError::InvalidKeystore(_) => "Stored keystore material is invalid".to_string(),
            // Safe user-facing messages (no secret material, no internals)
            SsoError::ConfigNotFound
            | SsoError::AmbiguousConfigState { .. }
            | SsoError::UnsupportedConfigCode(_)
            | SsoError::Upstream(_)
            | SsoError::MissingIdpUrl
            | SsoError::MissingKeyMaterial => self.to_string(),
        };

        let body = ErrorResponse {
            error: error_code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}
