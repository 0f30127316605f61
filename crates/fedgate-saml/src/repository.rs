//! Tenant configuration repository.
//!
//! Enforces the single-record invariant over the raw store and exposes the
//! code-keyed field-update surface shared with the legacy service.

use crate::error::{SsoError, SsoResult};
use crate::models::{ConfigCode, TenantConfiguration};
use crate::store::ConfigStore;
use fedgate_core::TenantId;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

/// Repository over the per-tenant configuration store.
///
/// Cheap to clone; clones share the underlying store.
#[derive(Clone)]
pub struct ConfigRepository {
    store: Arc<dyn ConfigStore>,
}

impl ConfigRepository {
    #[must_use]
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self { store }
    }

    /// Fetch the tenant's configuration.
    ///
    /// Zero rows yields a fresh, unpersisted configuration when
    /// `allow_create` is set and [`SsoError::ConfigNotFound`] otherwise.
    /// More than one row is a consistency violation and always fails with
    /// [`SsoError::AmbiguousConfigState`]; it is never resolved here.
    pub async fn get(
        &self,
        tenant_id: TenantId,
        allow_create: bool,
    ) -> SsoResult<TenantConfiguration> {
        let mut rows = self.store.rows_for_tenant(tenant_id).await?;

        match rows.len() {
            0 if allow_create => Ok(TenantConfiguration::default()),
            0 => Err(SsoError::ConfigNotFound),
            1 => Ok(rows.remove(0)),
            count => Err(SsoError::AmbiguousConfigState { count }),
        }
    }

    /// Insert or update the configuration, keyed by the presence of `id`.
    ///
    /// The caller must have read through [`get`](Self::get) beforehand; this
    /// is what keeps the persisted row count per tenant at one.
    pub async fn upsert(
        &self,
        tenant_id: TenantId,
        config: TenantConfiguration,
    ) -> SsoResult<TenantConfiguration> {
        let inserting = config.id.is_none();
        let stored = if inserting {
            self.store.insert(tenant_id, config).await?
        } else {
            self.store.update(tenant_id, config).await?
        };

        info!(
            tenant_id = %tenant_id,
            config_id = ?stored.id,
            inserted = inserting,
            "Stored tenant SSO configuration"
        );
        Ok(stored)
    }

    /// Apply a single code-keyed field update and persist it.
    ///
    /// An unrecognized code fails with [`SsoError::UnsupportedConfigCode`]
    /// before anything is read or written.
    pub async fn store_entry(
        &self,
        tenant_id: TenantId,
        code: &str,
        value: &str,
    ) -> SsoResult<TenantConfiguration> {
        let code = ConfigCode::from_str(code)
            .map_err(|_| SsoError::UnsupportedConfigCode(code.to_string()))?;

        // An entry write may be the tenant's first configuration write.
        let mut config = self.get(tenant_id, true).await?;
        code.apply(&mut config, value);
        self.upsert(tenant_id, config).await
    }

    /// Apply several code-keyed updates to one in-memory configuration and
    /// persist them with a single upsert.
    ///
    /// All codes are validated before any mutation; bookkeeping codes
    /// (`id`, `idsList`) are skipped. The single upsert is what keeps
    /// multi-field updates (migration, keystore persistence) atomic with
    /// respect to the row-count invariant.
    pub async fn store_map(
        &self,
        tenant_id: TenantId,
        entries: &HashMap<String, String>,
    ) -> SsoResult<TenantConfiguration> {
        let mut parsed = Vec::with_capacity(entries.len());
        for (code, value) in entries {
            let code = ConfigCode::from_str(code)
                .map_err(|_| SsoError::UnsupportedConfigCode(code.clone()))?;
            parsed.push((code, value.as_str()));
        }

        let mut config = self.get(tenant_id, true).await?;
        for (code, value) in parsed {
            if code.is_bookkeeping() {
                continue;
            }
            code.apply(&mut config, value);
        }
        self.upsert(tenant_id, config).await
    }
}
