//! Migration of legacy configuration into the local store.
//!
//! The legacy key/value configuration service is the pre-existing system of
//! record. Migration pulls a tenant's entries into one local row exactly
//! once; repeated calls short-circuit on the existing row, which makes it
//! safe to run on every tenant install/upgrade event.

use crate::error::{SsoError, SsoResult};
use crate::models::{ConfigCode, TenantConfiguration};
use crate::repository::ConfigRepository;
use fedgate_config_client::LegacyConfigClient;
use fedgate_core::TenantId;
use std::str::FromStr;
use tracing::{info, warn};

/// Module scope of SSO entries in the legacy service.
pub const LEGACY_MODULE: &str = "LOGIN-SAML";

/// Configuration name scope of SSO entries in the legacy service.
pub const LEGACY_CONFIG_NAME: &str = "saml";

/// Reconciles the legacy configuration service with the local store.
#[derive(Clone)]
pub struct MigrationCoordinator {
    repository: ConfigRepository,
    legacy: LegacyConfigClient,
}

impl MigrationCoordinator {
    #[must_use]
    pub fn new(repository: ConfigRepository, legacy: LegacyConfigClient) -> Self {
        Self { repository, legacy }
    }

    /// Migrate a tenant's legacy configuration into the local store.
    ///
    /// Idempotent: an existing local row is returned unchanged without
    /// touching the legacy service. An ambiguous local state (more than one
    /// row) propagates unresolved. With `delete_after` set, legacy entries
    /// are deleted after the local row commits; deletion failures are logged
    /// and do not fail the migration, since the local copy is already the
    /// durable source of truth.
    pub async fn migrate(
        &self,
        tenant_id: TenantId,
        delete_after: bool,
    ) -> SsoResult<TenantConfiguration> {
        match self.repository.get(tenant_id, false).await {
            Ok(existing) => return Ok(existing),
            Err(SsoError::ConfigNotFound) => {}
            Err(e) => return Err(e),
        }

        let entries = self
            .legacy
            .list_entries(tenant_id, LEGACY_MODULE, LEGACY_CONFIG_NAME)
            .await?;

        let mut candidate = TenantConfiguration::default();
        let mut legacy_ids = Vec::with_capacity(entries.len());
        for entry in &entries {
            legacy_ids.push(entry.id.clone());
            match ConfigCode::from_str(&entry.code) {
                Ok(code) if code.is_bookkeeping() => {}
                Ok(code) => code.apply(&mut candidate, &entry.value),
                Err(_) => {
                    warn!(
                        tenant_id = %tenant_id,
                        code = %entry.code,
                        "Skipping unrecognized legacy configuration code"
                    );
                }
            }
        }
        candidate.legacy_entry_ids = legacy_ids;

        // Single upsert of the folded candidate; the row commits (or fails)
        // before any legacy deletion is attempted.
        let stored = self.repository.upsert(tenant_id, candidate).await?;

        info!(
            tenant_id = %tenant_id,
            entries = entries.len(),
            legacy_ids = ?stored.legacy_entry_ids,
            "Migrated legacy SSO configuration to local store"
        );

        if delete_after {
            self.delete_legacy_entries(tenant_id, &stored.legacy_entry_ids)
                .await;
        }

        Ok(stored)
    }

    /// Variant of [`migrate`](Self::migrate) for callers that must never
    /// hard-fail tenant bootstrap: any failure short of a consistency
    /// violation recovers to an empty, unpersisted configuration.
    pub async fn migrate_or_default(
        &self,
        tenant_id: TenantId,
        delete_after: bool,
    ) -> SsoResult<TenantConfiguration> {
        match self.migrate(tenant_id, delete_after).await {
            Ok(config) => Ok(config),
            // A multi-row state needs operator repair; never paper over it.
            Err(e @ SsoError::AmbiguousConfigState { .. }) => Err(e),
            Err(e) => {
                warn!(
                    tenant_id = %tenant_id,
                    error = %e,
                    "Legacy configuration migration failed; treating tenant as unconfigured"
                );
                Ok(TenantConfiguration::default())
            }
        }
    }

    /// Best-effort deletion of migrated legacy entries.
    async fn delete_legacy_entries(&self, tenant_id: TenantId, ids: &[String]) {
        for id in ids {
            if let Err(e) = self.legacy.delete_entry(tenant_id, id).await {
                warn!(
                    tenant_id = %tenant_id,
                    entry_id = %id,
                    error = %e,
                    "Failed to delete migrated legacy configuration entry"
                );
            }
        }
    }
}
