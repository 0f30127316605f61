//! Tenant-scoped SAML SSO configuration and client lifecycle.
//!
//! This crate manages everything around the protocol machinery, not the
//! protocol itself:
//! - per-tenant configuration records with a single-row consistency
//!   invariant ([`repository::ConfigRepository`])
//! - idempotent migration from the legacy key/value configuration service
//!   ([`migration::MigrationCoordinator`])
//! - client construction with lazy keystore generation
//!   ([`factory::ClientFactory`])
//! - a per-tenant client cache with single-flight loads
//!   ([`registry::ClientRegistry`])
//!
//! Assertion parsing, signature validation, and metadata XML generation are
//! the external federation library's concern; it consumes the
//! [`client::SamlClient`] handles built here.

pub mod client;
pub mod error;
pub mod factory;
pub mod migration;
pub mod models;
pub mod registry;
pub mod repository;
pub mod store;

pub use client::{Base64KeystoreSource, CredentialSource, SamlClient, SpCredentials};
pub use error::{SsoError, SsoResult};
pub use factory::ClientFactory;
pub use migration::{MigrationCoordinator, LEGACY_CONFIG_NAME, LEGACY_MODULE};
pub use models::{ConfigCode, SamlBinding, TenantConfiguration};
pub use registry::{CachedClient, ClientRegistry};
pub use repository::ConfigRepository;
pub use store::{run_migrations, ConfigStore, InMemoryConfigStore, PgConfigStore};
