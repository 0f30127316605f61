//! Protocol client handle and credential retrieval strategy.
//!
//! The cryptographic protocol work (assertion parsing, signing, metadata
//! XML) lives in the external federation library; [`SamlClient`] is the
//! fully-resolved bundle of configuration and key material that library
//! consumes.

use crate::error::{SsoError, SsoResult};
use crate::models::{SamlBinding, TenantConfiguration};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use fedgate_core::TenantId;

/// Service-provider secret material: a PKCS#12 bundle plus the passwords
/// protecting it.
#[derive(Clone)]
pub struct SpCredentials {
    /// Decoded PKCS#12 keystore bytes.
    pub keystore: Vec<u8>,
    /// Password protecting the keystore bundle.
    pub keystore_password: String,
    /// Password protecting the private key inside the bundle.
    pub private_key_password: String,
}

// Keystore bytes are secret material; keep them out of debug output.
impl std::fmt::Debug for SpCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpCredentials")
            .field("keystore_len", &self.keystore.len())
            .finish_non_exhaustive()
    }
}

/// Strategy for turning a configuration record into service-provider
/// credentials. Production decodes the stored base64 blob; tests inject
/// fixed material instead.
pub trait CredentialSource: Send + Sync {
    fn credentials(&self, config: &TenantConfiguration) -> SsoResult<SpCredentials>;
}

/// Production credential source: base64-decodes `keystore_blob`.
#[derive(Debug, Default)]
pub struct Base64KeystoreSource;

impl CredentialSource for Base64KeystoreSource {
    fn credentials(&self, config: &TenantConfiguration) -> SsoResult<SpCredentials> {
        let blob = config
            .keystore_blob
            .as_deref()
            .filter(|b| !b.is_empty())
            .ok_or(SsoError::MissingKeyMaterial)?;

        let keystore = BASE64
            .decode(blob)
            .map_err(|e| SsoError::InvalidKeystore(format!("base64 decode failed: {e}")))?;

        Ok(SpCredentials {
            keystore,
            keystore_password: config.keystore_password.clone().unwrap_or_default(),
            private_key_password: config.private_key_password.clone().unwrap_or_default(),
        })
    }
}

/// Test credential source returning fixed material.
#[derive(Debug, Clone)]
pub struct StaticCredentialSource {
    pub keystore: Vec<u8>,
    pub keystore_password: String,
    pub private_key_password: String,
}

impl CredentialSource for StaticCredentialSource {
    fn credentials(&self, _config: &TenantConfiguration) -> SsoResult<SpCredentials> {
        Ok(SpCredentials {
            keystore: self.keystore.clone(),
            keystore_password: self.keystore_password.clone(),
            private_key_password: self.private_key_password.clone(),
        })
    }
}

/// A built, ready-to-use protocol client handle for one tenant.
#[derive(Debug, Clone)]
pub struct SamlClient {
    tenant_id: TenantId,
    idp_url: String,
    binding: SamlBinding,
    callback_url: String,
    credentials: SpCredentials,
}

impl SamlClient {
    #[must_use]
    pub fn new(
        tenant_id: TenantId,
        idp_url: String,
        binding: SamlBinding,
        callback_url: String,
        credentials: SpCredentials,
    ) -> Self {
        Self {
            tenant_id,
            idp_url,
            binding,
            callback_url,
            credentials,
        }
    }

    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    #[must_use]
    pub fn idp_url(&self) -> &str {
        &self.idp_url
    }

    #[must_use]
    pub fn binding(&self) -> SamlBinding {
        self.binding
    }

    /// The externally visible service-provider callback URL. Deterministic:
    /// repeated builds for the same tenant produce the same value.
    #[must_use]
    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }

    #[must_use]
    pub fn credentials(&self) -> &SpCredentials {
        &self.credentials
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_source_decodes_stored_blob() {
        let config = TenantConfiguration {
            keystore_blob: Some(BASE64.encode(b"keystore-bytes")),
            keystore_password: Some("ks-pass".to_string()),
            private_key_password: Some("pk-pass".to_string()),
            ..TenantConfiguration::default()
        };

        let creds = Base64KeystoreSource.credentials(&config).unwrap();
        assert_eq!(creds.keystore, b"keystore-bytes");
        assert_eq!(creds.keystore_password, "ks-pass");
        assert_eq!(creds.private_key_password, "pk-pass");
    }

    #[test]
    fn base64_source_requires_blob() {
        let config = TenantConfiguration::default();
        assert!(matches!(
            Base64KeystoreSource.credentials(&config),
            Err(SsoError::MissingKeyMaterial)
        ));

        let config = TenantConfiguration {
            keystore_blob: Some(String::new()),
            ..TenantConfiguration::default()
        };
        assert!(matches!(
            Base64KeystoreSource.credentials(&config),
            Err(SsoError::MissingKeyMaterial)
        ));
    }

    #[test]
    fn base64_source_rejects_garbage() {
        let config = TenantConfiguration {
            keystore_blob: Some("not base64!!!".to_string()),
            ..TenantConfiguration::default()
        };
        assert!(matches!(
            Base64KeystoreSource.credentials(&config),
            Err(SsoError::InvalidKeystore(_))
        ));
    }

    #[test]
    fn credentials_debug_hides_material() {
        let creds = SpCredentials {
            keystore: b"secret".to_vec(),
            keystore_password: "p1".to_string(),
            private_key_password: "p2".to_string(),
        };
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("secret"));
        assert!(!rendered.contains("p1"));
    }
}
