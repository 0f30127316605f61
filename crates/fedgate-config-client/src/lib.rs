//! HTTP client for the legacy key/value configuration service.
//!
//! Tenants migrating to locally stored SSO configuration still have entries
//! in this service; [`LegacyConfigClient`] is what the migration coordinator
//! uses to read and clean them up.

pub mod client;
pub mod error;
pub mod models;

pub use client::{LegacyConfigClient, TENANT_HEADER};
pub use error::{ConfigClientError, ConfigClientResult};
pub use models::ConfigEntry;
