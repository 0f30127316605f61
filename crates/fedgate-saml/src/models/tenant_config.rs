//! Tenant SSO configuration model.
//!
//! One record per tenant; the local store enforces (and the repository
//! verifies) that no tenant ever accumulates more than one row.

use serde::{Deserialize, Serialize};

/// Default service-provider callback path when none is configured.
pub const DEFAULT_CALLBACK_PATH: &str = "/saml/callback";

/// HTTP binding used to carry a protocol request to the identity provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SamlBinding {
    /// HTTP-POST form binding (the default).
    #[default]
    Post,
    /// HTTP-Redirect query-string binding.
    Redirect,
}

impl SamlBinding {
    /// Parse a stored binding value. Anything other than `REDIRECT`
    /// (including an absent value) selects the POST binding.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("REDIRECT") {
            SamlBinding::Redirect
        } else {
            SamlBinding::Post
        }
    }
}

impl std::fmt::Display for SamlBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SamlBinding::Post => write!(f, "POST"),
            SamlBinding::Redirect => write!(f, "REDIRECT"),
        }
    }
}

/// Per-tenant SSO configuration.
///
/// `id` is assigned by the local store on first insert and is `None` for a
/// configuration that has not been persisted yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantConfiguration {
    /// Local store row identifier; absent until persisted.
    pub id: Option<uuid::Uuid>,
    /// Identity provider endpoint; required before a client can be built.
    pub idp_url: Option<String>,
    /// Base64-encoded PKCS#12 keystore holding the service provider's
    /// signing key and certificate.
    pub keystore_blob: Option<String>,
    /// Password protecting the keystore bundle.
    pub keystore_password: Option<String>,
    /// Password protecting the private key inside the bundle.
    pub private_key_password: Option<String>,
    /// Binding used for outbound authentication requests.
    pub binding: SamlBinding,
    /// Assertion attribute carrying the federated identity.
    pub saml_attribute: Option<String>,
    /// Local user property the federated identity is matched against.
    pub user_property: Option<String>,
    /// Cached identity provider metadata XML.
    pub idp_metadata: Option<String>,
    /// Path component of the service-provider callback URL.
    pub callback_path: Option<String>,
    /// Gateway base URL the callback URL is constructed from.
    pub base_url: Option<String>,
    /// Set whenever secret material changes; previously published
    /// service-provider metadata is stale until republished.
    pub metadata_invalidated: bool,
    /// Identifiers of the legacy entries this record was migrated from.
    /// Empty if the record was never migrated. Bookkeeping only; consumed
    /// by post-migration deletion.
    pub legacy_entry_ids: Vec<String>,
}

impl TenantConfiguration {
    /// Effective callback path, falling back to [`DEFAULT_CALLBACK_PATH`].
    #[must_use]
    pub fn callback_path(&self) -> &str {
        self.callback_path
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_CALLBACK_PATH)
    }

    /// Compare configuration content, ignoring the bookkeeping fields
    /// (`id`, `legacy_entry_ids`).
    #[must_use]
    pub fn content_eq(&self, other: &Self) -> bool {
        let strip = |c: &Self| {
            let mut c = c.clone();
            c.id = None;
            c.legacy_entry_ids = Vec::new();
            c
        };
        strip(self) == strip(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binding_parses_redirect_case_insensitively() {
        assert_eq!(SamlBinding::parse("REDIRECT"), SamlBinding::Redirect);
        assert_eq!(SamlBinding::parse("redirect"), SamlBinding::Redirect);
    }

    #[test]
    fn binding_defaults_to_post() {
        assert_eq!(SamlBinding::parse("POST"), SamlBinding::Post);
        assert_eq!(SamlBinding::parse(""), SamlBinding::Post);
        assert_eq!(SamlBinding::parse("anything"), SamlBinding::Post);
        assert_eq!(SamlBinding::default(), SamlBinding::Post);
    }

    #[test]
    fn callback_path_falls_back_to_default() {
        let mut config = TenantConfiguration::default();
        assert_eq!(config.callback_path(), DEFAULT_CALLBACK_PATH);

        config.callback_path = Some(String::new());
        assert_eq!(config.callback_path(), DEFAULT_CALLBACK_PATH);

        config.callback_path = Some("/sso/return".to_string());
        assert_eq!(config.callback_path(), "/sso/return");
    }

    #[test]
    fn content_eq_ignores_bookkeeping_fields() {
        let mut a = TenantConfiguration {
            idp_url: Some("https://idp.example.com".to_string()),
            ..TenantConfiguration::default()
        };
        let mut b = a.clone();
        a.id = Some(uuid::Uuid::new_v4());
        b.legacy_entry_ids = vec!["x".to_string()];

        assert!(a.content_eq(&b));

        b.idp_url = Some("https://other.example.com".to_string());
        assert!(!a.content_eq(&b));
    }
}
