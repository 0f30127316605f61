//! Data model for tenant SSO configuration.

pub mod codes;
pub mod tenant_config;

pub use codes::ConfigCode;
pub use tenant_config::{SamlBinding, TenantConfiguration, DEFAULT_CALLBACK_PATH};
