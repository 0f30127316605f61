//! Protocol client construction.
//!
//! Builds a [`SamlClient`] from a tenant's configuration record. When the
//! record has no keystore and generation is permitted, a fresh PKCS#12
//! bundle is generated on the blocking pool, persisted through a single
//! atomic `store_map`, and the handle is constructed from the in-memory
//! bytes.

use crate::client::{CredentialSource, SamlClient, SpCredentials};
use crate::error::{SsoError, SsoResult};
use crate::models::{ConfigCode, TenantConfiguration};
use crate::repository::ConfigRepository;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use fedgate_core::TenantId;
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use tracing::{info, warn};

/// Length of generated keystore passphrases.
const GENERATED_PASSWORD_LEN: usize = 20;

/// Validity of the generated self-signed certificate, in days.
const CERTIFICATE_VALIDITY_DAYS: u32 = 3650;

/// Builds protocol client handles from configuration records.
#[derive(Clone)]
pub struct ClientFactory {
    repository: ConfigRepository,
    source: Arc<dyn CredentialSource>,
}

impl ClientFactory {
    #[must_use]
    pub fn new(repository: ConfigRepository, source: Arc<dyn CredentialSource>) -> Self {
        Self { repository, source }
    }

    /// Build a client handle for a tenant.
    ///
    /// Requires `idp_url`. With key material present, construction is pure
    /// (no IO). With key material absent, `allow_generate` gates the
    /// generate-and-persist path; when it is false the call fails with
    /// [`SsoError::MissingKeyMaterial`] and mutates nothing.
    pub async fn build(
        &self,
        config: &TenantConfiguration,
        allow_generate: bool,
        tenant_id: TenantId,
    ) -> SsoResult<SamlClient> {
        let idp_url = config
            .idp_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or(SsoError::MissingIdpUrl)?
            .to_string();

        let callback_url = sp_callback_url(config, tenant_id);

        let has_keystore = config
            .keystore_blob
            .as_deref()
            .is_some_and(|b| !b.is_empty());

        let credentials = if has_keystore {
            self.source.credentials(config)?
        } else if allow_generate {
            self.generate_and_persist(config, tenant_id, &callback_url)
                .await?
        } else {
            return Err(SsoError::MissingKeyMaterial);
        };

        Ok(SamlClient::new(
            tenant_id,
            idp_url,
            config.binding,
            callback_url,
            credentials,
        ))
    }

    /// Generate fresh key material, persist it, and return it.
    ///
    /// Generation and the temporary-file round trip run on the blocking
    /// pool; the temporary artifact is deleted once its bytes are back in
    /// memory, before (and regardless of) the persistence step. Persistence
    /// of blob, passwords, and the stale-metadata marker is one atomic
    /// `store_map`; the handle is only built after it commits.
    async fn generate_and_persist(
        &self,
        config: &TenantConfiguration,
        tenant_id: TenantId,
        callback_url: &str,
    ) -> SsoResult<SpCredentials> {
        let keystore_password = config
            .keystore_password
            .clone()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(random_token);
        let private_key_password = config
            .private_key_password
            .clone()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(random_token);

        // X.509 caps CommonName at 64 bytes, which the callback URL
        // exceeds for any real gateway; the URL goes into a subjectAltName
        // URI instead and the CommonName carries the tenant id.
        let common_name = tenant_id.to_string();
        let subject_alt_uri = callback_url.to_string();
        let password = keystore_password.clone();
        let keystore = tokio::task::spawn_blocking(move || -> SsoResult<Vec<u8>> {
            let der = generate_keystore(&common_name, &subject_alt_uri, &password)?;

            // Round-trip through a temporary file; the file is removed when
            // it drops at the end of this scope, success or not.
            let mut file = tempfile::NamedTempFile::new()?;
            file.write_all(&der)?;
            file.flush()?;
            let bytes = std::fs::read(file.path())?;
            Ok(bytes)
        })
        .await
        .map_err(|e| SsoError::Internal(format!("Keystore generation task failed: {e}")))??;

        let mut entries = HashMap::new();
        entries.insert(
            ConfigCode::KeystoreFile.as_str().to_string(),
            BASE64.encode(&keystore),
        );
        entries.insert(
            ConfigCode::KeystorePassword.as_str().to_string(),
            keystore_password.clone(),
        );
        entries.insert(
            ConfigCode::KeystorePrivateKeyPassword.as_str().to_string(),
            private_key_password.clone(),
        );
        entries.insert(
            ConfigCode::MetadataInvalidated.as_str().to_string(),
            "true".to_string(),
        );
        self.repository.store_map(tenant_id, &entries).await?;

        info!(
            tenant_id = %tenant_id,
            "Generated and persisted service provider keystore"
        );

        Ok(SpCredentials {
            keystore,
            keystore_password,
            private_key_password,
        })
    }
}

/// Service-provider callback URL for a tenant.
///
/// Deterministic in its inputs so repeated builds publish the same
/// externally visible endpoint.
#[must_use]
pub fn sp_callback_url(config: &TenantConfiguration, tenant_id: TenantId) -> String {
    let base = config
        .base_url
        .as_deref()
        .unwrap_or_default()
        .trim_end_matches('/');
    if base.is_empty() {
        warn!(
            tenant_id = %tenant_id,
            "No gateway base URL configured; publishing a relative callback URL"
        );
    }
    format!(
        "{base}/_/invoke/tenant/{tenant_id}{path}",
        path = config.callback_path()
    )
}

/// Random alphanumeric passphrase for generated key material.
fn random_token() -> String {
    use rand::distributions::Alphanumeric;
    use rand::rngs::OsRng;
    use rand::Rng;

    (0..GENERATED_PASSWORD_LEN)
        .map(|_| OsRng.sample(Alphanumeric) as char)
        .collect()
}

/// Generate a PKCS#12 keystore with a fresh RSA key and self-signed
/// certificate. The subject CommonName must fit the 64-byte X.509 limit;
/// `subject_alt_uri` carries the (arbitrarily long) callback URL as a
/// subjectAltName URI entry. CPU-bound; call from the blocking pool.
fn generate_keystore(common_name: &str, subject_alt_uri: &str, password: &str) -> SsoResult<Vec<u8>> {
    use openssl::asn1::Asn1Time;
    use openssl::bn::{BigNum, MsbOption};
    use openssl::hash::MessageDigest;
    use openssl::nid::Nid;
    use openssl::pkcs12::Pkcs12;
    use openssl::pkey::PKey;
    use openssl::rsa::Rsa;
    use openssl::x509::extension::SubjectAlternativeName;
    use openssl::x509::{X509NameBuilder, X509};

    let rsa = Rsa::generate(2048)?;
    let pkey = PKey::from_rsa(rsa)?;

    let mut name = X509NameBuilder::new()?;
    name.append_entry_by_nid(Nid::COMMONNAME, common_name)?;
    let name = name.build();

    let mut builder = X509::builder()?;
    builder.set_version(2)?;
    let serial = {
        let mut bn = BigNum::new()?;
        bn.rand(64, MsbOption::MAYBE_ZERO, false)?;
        bn.to_asn1_integer()?
    };
    builder.set_serial_number(&serial)?;
    builder.set_subject_name(&name)?;
    builder.set_issuer_name(&name)?;
    builder.set_pubkey(&pkey)?;
    let san = SubjectAlternativeName::new()
        .uri(subject_alt_uri)
        .build(&builder.x509v3_context(None, None))?;
    builder.append_extension(san)?;
    let not_before = Asn1Time::days_from_now(0)?;
    let not_after = Asn1Time::days_from_now(CERTIFICATE_VALIDITY_DAYS)?;
    builder.set_not_before(&not_before)?;
    builder.set_not_after(&not_after)?;
    builder.sign(&pkey, MessageDigest::sha256())?;
    let cert = builder.build();

    let pkcs12 = Pkcs12::builder()
        .name("service-provider")
        .pkey(&pkey)
        .cert(&cert)
        .build2(password)?;

    Ok(pkcs12.to_der()?)
}
