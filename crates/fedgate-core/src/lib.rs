//! fedgate core library
//!
//! Shared types for the fedgate identity federation gateway.
//!
//! # Modules
//!
//! - [`ids`] - Strongly typed identifiers (`TenantId`)

pub mod ids;

pub use ids::{ParseIdError, TenantId};
