//! Recognized configuration codes and the code-to-field dispatch table.
//!
//! The same code vocabulary is used by the legacy configuration service and
//! by the local store's field-update surface. Adding a code means adding a
//! variant and one `MUTATORS` row; `mutator_table_is_complete` guards the
//! pairing.

use super::tenant_config::{SamlBinding, TenantConfiguration};
use std::str::FromStr;

/// Configuration codes shared by both stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigCode {
    /// Row identifier (bookkeeping).
    Id,
    /// Identity provider endpoint.
    IdpUrl,
    /// Base64-encoded service-provider keystore.
    KeystoreFile,
    /// Keystore password.
    KeystorePassword,
    /// Private key password.
    KeystorePrivateKeyPassword,
    /// Request binding (`POST` / `REDIRECT`).
    SamlBinding,
    /// Assertion attribute carrying the federated identity.
    SamlAttribute,
    /// Cached identity provider metadata XML.
    IdpMetadata,
    /// Local user property matched against the federated identity.
    UserProperty,
    /// Stale-metadata marker.
    MetadataInvalidated,
    /// Gateway base URL.
    OkapiUrl,
    /// Service-provider callback path.
    SamlCallback,
    /// Legacy entry id list (bookkeeping).
    IdsList,
}

impl ConfigCode {
    /// All recognized codes.
    pub const ALL: &'static [ConfigCode] = &[
        ConfigCode::Id,
        ConfigCode::IdpUrl,
        ConfigCode::KeystoreFile,
        ConfigCode::KeystorePassword,
        ConfigCode::KeystorePrivateKeyPassword,
        ConfigCode::SamlBinding,
        ConfigCode::SamlAttribute,
        ConfigCode::IdpMetadata,
        ConfigCode::UserProperty,
        ConfigCode::MetadataInvalidated,
        ConfigCode::OkapiUrl,
        ConfigCode::SamlCallback,
        ConfigCode::IdsList,
    ];

    /// Wire representation of the code.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigCode::Id => "id",
            ConfigCode::IdpUrl => "idp.url",
            ConfigCode::KeystoreFile => "keystore.file",
            ConfigCode::KeystorePassword => "keystore.password",
            ConfigCode::KeystorePrivateKeyPassword => "keystore.privatekey.password",
            ConfigCode::SamlBinding => "saml.binding",
            ConfigCode::SamlAttribute => "saml.attribute",
            ConfigCode::IdpMetadata => "idp.metadata",
            ConfigCode::UserProperty => "user.property",
            ConfigCode::MetadataInvalidated => "metadata.invalidated",
            ConfigCode::OkapiUrl => "okapi.url",
            ConfigCode::SamlCallback => "saml.callback",
            ConfigCode::IdsList => "idsList",
        }
    }

    /// Bookkeeping codes carry store metadata, not configuration content.
    /// They are excluded from map-based bulk updates and from comparison.
    #[must_use]
    pub fn is_bookkeeping(&self) -> bool {
        matches!(self, ConfigCode::Id | ConfigCode::IdsList)
    }

    /// Apply this code's field mutation to a configuration.
    ///
    /// Bookkeeping codes apply as no-ops: both stores legitimately carry
    /// them on the wire, but their values are owned by the stores.
    pub fn apply(&self, config: &mut TenantConfiguration, value: &str) {
        let mutator = MUTATORS
            .iter()
            .find(|(code, _)| code == self)
            .map(|(_, mutator)| *mutator)
            .unwrap_or(mutate_nothing);
        mutator(config, value);
    }
}

impl std::fmt::Display for ConfigCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ConfigCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigCode::ALL
            .iter()
            .find(|code| code.as_str() == s)
            .copied()
            .ok_or_else(|| format!("Unrecognized configuration code: {s}"))
    }
}

type Mutator = fn(&mut TenantConfiguration, &str);

fn mutate_nothing(_: &mut TenantConfiguration, _: &str) {}

fn mutate_idp_url(config: &mut TenantConfiguration, value: &str) {
    config.idp_url = Some(value.to_string());
}

fn mutate_keystore_blob(config: &mut TenantConfiguration, value: &str) {
    config.keystore_blob = Some(value.to_string());
}

fn mutate_keystore_password(config: &mut TenantConfiguration, value: &str) {
    config.keystore_password = Some(value.to_string());
}

fn mutate_private_key_password(config: &mut TenantConfiguration, value: &str) {
    config.private_key_password = Some(value.to_string());
}

fn mutate_binding(config: &mut TenantConfiguration, value: &str) {
    config.binding = SamlBinding::parse(value);
}

fn mutate_saml_attribute(config: &mut TenantConfiguration, value: &str) {
    config.saml_attribute = Some(value.to_string());
}

fn mutate_idp_metadata(config: &mut TenantConfiguration, value: &str) {
    config.idp_metadata = Some(value.to_string());
}

fn mutate_user_property(config: &mut TenantConfiguration, value: &str) {
    config.user_property = Some(value.to_string());
}

fn mutate_metadata_invalidated(config: &mut TenantConfiguration, value: &str) {
    config.metadata_invalidated = value.eq_ignore_ascii_case("true");
}

fn mutate_base_url(config: &mut TenantConfiguration, value: &str) {
    config.base_url = Some(value.to_string());
}

fn mutate_callback_path(config: &mut TenantConfiguration, value: &str) {
    config.callback_path = Some(value.to_string());
}

/// Static dispatch table, one row per recognized code.
const MUTATORS: &[(ConfigCode, Mutator)] = &[
    (ConfigCode::Id, mutate_nothing),
    (ConfigCode::IdpUrl, mutate_idp_url),
    (ConfigCode::KeystoreFile, mutate_keystore_blob),
    (ConfigCode::KeystorePassword, mutate_keystore_password),
    (
        ConfigCode::KeystorePrivateKeyPassword,
        mutate_private_key_password,
    ),
    (ConfigCode::SamlBinding, mutate_binding),
    (ConfigCode::SamlAttribute, mutate_saml_attribute),
    (ConfigCode::IdpMetadata, mutate_idp_metadata),
    (ConfigCode::UserProperty, mutate_user_property),
    (ConfigCode::MetadataInvalidated, mutate_metadata_invalidated),
    (ConfigCode::OkapiUrl, mutate_base_url),
    (ConfigCode::SamlCallback, mutate_callback_path),
    (ConfigCode::IdsList, mutate_nothing),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutator_table_is_complete() {
        for code in ConfigCode::ALL {
            assert!(
                MUTATORS.iter().any(|(c, _)| c == code),
                "no mutator registered for code {code}"
            );
        }
        assert_eq!(MUTATORS.len(), ConfigCode::ALL.len());
    }

    #[test]
    fn codes_round_trip_through_wire_form() {
        for code in ConfigCode::ALL {
            assert_eq!(code.as_str().parse::<ConfigCode>().unwrap(), *code);
        }
    }

    #[test]
    fn unknown_code_fails_to_parse() {
        assert!("bogus".parse::<ConfigCode>().is_err());
        // Case matters on the wire.
        assert!("IDP.URL".parse::<ConfigCode>().is_err());
    }

    #[test]
    fn apply_mutates_only_the_selected_field() {
        let mut config = TenantConfiguration::default();
        ConfigCode::IdpUrl.apply(&mut config, "https://idp.example.com");

        let expected = TenantConfiguration {
            idp_url: Some("https://idp.example.com".to_string()),
            ..TenantConfiguration::default()
        };
        assert_eq!(config, expected);
    }

    #[test]
    fn bookkeeping_codes_apply_as_noops() {
        let mut config = TenantConfiguration::default();
        ConfigCode::Id.apply(&mut config, "some-id");
        ConfigCode::IdsList.apply(&mut config, "a,b,c");
        assert_eq!(config, TenantConfiguration::default());
    }

    #[test]
    fn metadata_invalidated_parses_boolean() {
        let mut config = TenantConfiguration::default();
        ConfigCode::MetadataInvalidated.apply(&mut config, "true");
        assert!(config.metadata_invalidated);
        ConfigCode::MetadataInvalidated.apply(&mut config, "false");
        assert!(!config.metadata_invalidated);
    }
}
