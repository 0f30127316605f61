//! Legacy configuration service HTTP client (reqwest-based).
//!
//! The legacy service is a generic key/value configuration store. Entries are
//! scoped by `(module, configName)` and addressed by a `code`; reads use a
//! CQL-style query string.

use crate::error::{ConfigClientError, ConfigClientResult};
use crate::models::{ConfigEntry, ConfigEntryList, EntryPayload};
use fedgate_core::TenantId;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, info};

/// Header carrying the tenant scope on every request.
pub const TENANT_HEADER: &str = "X-Tenant-ID";

/// Upper bound on entries fetched per scoped query. A `(module, configName)`
/// scope holds at most a handful of codes.
const QUERY_LIMIT: u32 = 100;

/// Client for the legacy key/value configuration service.
///
/// Wraps `reqwest::Client` with fixed connect and request timeouts. There is
/// no per-call cancellation: a caller that gives up simply drops the future
/// and the request runs to completion or failure on its own.
#[derive(Debug, Clone)]
pub struct LegacyConfigClient {
    /// Base URL of the service, without trailing slash.
    base_url: String,
    /// Optional bearer token forwarded on every call.
    token: Option<String>,
    http_client: Client,
}

impl LegacyConfigClient {
    /// Create a new client.
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> ConfigClientResult<Self> {
        let http_client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .user_agent("fedgate-config-client/1.0")
            .build()
            .map_err(|e| {
                ConfigClientError::InvalidConfig(format!("Failed to build HTTP client: {e}"))
            })?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ConfigClientError::InvalidConfig(
                "base URL must not be empty".to_string(),
            ));
        }

        Ok(Self {
            base_url,
            token,
            http_client,
        })
    }

    /// List all entries in a `(module, configName)` scope.
    pub async fn list_entries(
        &self,
        tenant: TenantId,
        module: &str,
        config_name: &str,
    ) -> ConfigClientResult<Vec<ConfigEntry>> {
        let query = format!("(module=={module} AND configName=={config_name})");
        self.query_entries(tenant, &query).await
    }

    /// Create or update a single entry in a `(module, configName)` scope.
    ///
    /// Whether this is a create or an update is decided by a prior lookup of
    /// the code within the scope; the legacy service has no upsert verb.
    /// Returns the entry's identifier.
    pub async fn store_entry(
        &self,
        tenant: TenantId,
        module: &str,
        config_name: &str,
        code: &str,
        value: &str,
    ) -> ConfigClientResult<String> {
        let query = format!("(module=={module} AND configName=={config_name} AND code=={code})");
        let existing = self.query_entries(tenant, &query).await?;

        let payload = EntryPayload {
            module,
            config_name,
            code,
            value,
        };

        if let Some(entry) = existing.into_iter().next() {
            let url = format!("{}/configurations/entries/{}", self.base_url, entry.id);
            let response = self
                .request(self.http_client.put(&url), tenant)
                .json(&payload)
                .send()
                .await?;
            Self::check_status(response.status())?;

            debug!(tenant = %tenant, code, id = %entry.id, "Updated legacy configuration entry");
            Ok(entry.id)
        } else {
            let url = format!("{}/configurations/entries", self.base_url);
            let response = self
                .request(self.http_client.post(&url), tenant)
                .json(&payload)
                .send()
                .await?;
            Self::check_status(response.status())?;

            let created: ConfigEntry = response
                .json()
                .await
                .map_err(|e| ConfigClientError::InvalidResponse(e.to_string()))?;

            debug!(tenant = %tenant, code, id = %created.id, "Created legacy configuration entry");
            Ok(created.id)
        }
    }

    /// Delete an entry by id.
    ///
    /// The client surfaces failures; callers that treat deletion as
    /// best-effort are expected to log and continue.
    pub async fn delete_entry(&self, tenant: TenantId, id: &str) -> ConfigClientResult<()> {
        let url = format!("{}/configurations/entries/{id}", self.base_url);
        let response = self
            .request(self.http_client.delete(&url), tenant)
            .send()
            .await?;
        Self::check_status(response.status())?;

        info!(tenant = %tenant, id, "Deleted legacy configuration entry");
        Ok(())
    }

    async fn query_entries(
        &self,
        tenant: TenantId,
        query: &str,
    ) -> ConfigClientResult<Vec<ConfigEntry>> {
        let url = format!("{}/configurations/entries", self.base_url);
        let limit = QUERY_LIMIT.to_string();
        let response = self
            .request(self.http_client.get(&url), tenant)
            .query(&[("query", query), ("limit", limit.as_str())])
            .send()
            .await?;
        Self::check_status(response.status())?;

        let list: ConfigEntryList = response
            .json()
            .await
            .map_err(|e| ConfigClientError::InvalidResponse(e.to_string()))?;

        debug!(
            tenant = %tenant,
            query,
            total = list.total_records,
            "Queried legacy configuration entries"
        );
        Ok(list.configs)
    }

    fn request(
        &self,
        builder: reqwest::RequestBuilder,
        tenant: TenantId,
    ) -> reqwest::RequestBuilder {
        let builder = builder.header(TENANT_HEADER, tenant.to_string());
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn check_status(status: StatusCode) -> ConfigClientResult<()> {
        if status.is_success() {
            Ok(())
        } else {
            Err(ConfigClientError::UpstreamStatus {
                status: status.as_u16(),
            })
        }
    }
}
