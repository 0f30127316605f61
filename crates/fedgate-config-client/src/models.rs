//! Wire models for the legacy configuration service.
//!
//! The service stores generic `{module, configName, code, value}` entries and
//! returns them wrapped in a `configs`/`totalRecords` envelope.

use serde::{Deserialize, Serialize};

/// One configuration entry as stored by the legacy service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigEntry {
    /// Identifier assigned by the legacy service.
    pub id: String,
    /// Configuration code, e.g. `idp.url`.
    pub code: String,
    /// Stored value.
    #[serde(default)]
    pub value: String,
}

/// List envelope returned by the entries query endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigEntryList {
    #[serde(default)]
    pub configs: Vec<ConfigEntry>,
    #[serde(default)]
    pub total_records: i64,
}

/// Request body for creating or updating an entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPayload<'a> {
    pub module: &'a str,
    pub config_name: &'a str,
    pub code: &'a str,
    pub value: &'a str,
}
