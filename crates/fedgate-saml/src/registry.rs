//! Per-tenant protocol client cache.
//!
//! The registry is an explicit object owned by the embedding service and
//! injected into request handlers; there is no global state. Loads are
//! single-flight per tenant: the per-tenant slot lock is held across the
//! whole read/migrate/build sequence, so concurrent misses for one tenant
//! coalesce into one load.

use crate::client::SamlClient;
use crate::error::{SsoError, SsoResult};
use crate::factory::ClientFactory;
use crate::migration::MigrationCoordinator;
use crate::models::TenantConfiguration;
use crate::repository::ConfigRepository;
use fedgate_core::TenantId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// A cached client together with the configuration snapshot it was built
/// from. Not persisted; rebuilt from the local store after any restart.
#[derive(Clone)]
pub struct CachedClient {
    pub client: Arc<SamlClient>,
    pub config: TenantConfiguration,
}

type Slot = Arc<Mutex<Option<CachedClient>>>;

/// Tenant-to-client cache with lazy population.
pub struct ClientRegistry {
    repository: ConfigRepository,
    coordinator: MigrationCoordinator,
    factory: ClientFactory,
    slots: Mutex<HashMap<TenantId, Slot>>,
}

impl ClientRegistry {
    #[must_use]
    pub fn new(
        repository: ConfigRepository,
        coordinator: MigrationCoordinator,
        factory: ClientFactory,
    ) -> Self {
        Self {
            repository,
            coordinator,
            factory,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Return the tenant's client, loading it on first access.
    ///
    /// Cache hit: no IO. Cache miss: read the local configuration, falling
    /// back to legacy migration when no row exists, then build a client.
    /// A failed load is never cached; the next call retries from scratch.
    pub async fn find_or_load(
        &self,
        tenant_id: TenantId,
        allow_generate: bool,
    ) -> SsoResult<Arc<SamlClient>> {
        let slot = self.slot(tenant_id).await;
        let mut guard = slot.lock().await;

        if let Some(cached) = guard.as_ref() {
            return Ok(Arc::clone(&cached.client));
        }

        let config = match self.repository.get(tenant_id, false).await {
            Ok(config) => config,
            Err(SsoError::ConfigNotFound) => {
                debug!(
                    tenant_id = %tenant_id,
                    "No local SSO configuration; attempting legacy migration"
                );
                self.coordinator.migrate(tenant_id, false).await?;
                // Re-read once so the build works from the persisted row.
                self.repository.get(tenant_id, false).await?
            }
            Err(e) => return Err(e),
        };

        let had_keystore = config
            .keystore_blob
            .as_deref()
            .is_some_and(|b| !b.is_empty());
        let client = Arc::new(self.factory.build(&config, allow_generate, tenant_id).await?);

        // A build without key material generates and persists it; re-read
        // the row so the cached snapshot matches the store and the client.
        let config = if had_keystore {
            config
        } else {
            self.repository.get(tenant_id, false).await?
        };
        *guard = Some(CachedClient {
            client: Arc::clone(&client),
            config,
        });

        info!(tenant_id = %tenant_id, "Cached SSO client for tenant");
        Ok(client)
    }

    /// Drop the tenant's cache entry unconditionally.
    ///
    /// Called after any operation that changes persisted configuration so
    /// the next access rebuilds from fresh state.
    pub async fn invalidate(&self, tenant_id: TenantId) {
        let removed = self.slots.lock().await.remove(&tenant_id).is_some();
        debug!(tenant_id = %tenant_id, removed, "Invalidated cached SSO client");
    }

    /// Configuration snapshot the tenant's cached client was built from,
    /// if one is cached.
    pub async fn cached_config(&self, tenant_id: TenantId) -> Option<TenantConfiguration> {
        let slot = {
            let slots = self.slots.lock().await;
            slots.get(&tenant_id).cloned()
        };
        match slot {
            Some(slot) => slot.lock().await.as_ref().map(|c| c.config.clone()),
            None => None,
        }
    }

    /// Get or create the per-tenant slot. The outer lock is held only for
    /// the map access, never across a load.
    async fn slot(&self, tenant_id: TenantId) -> Slot {
        let mut slots = self.slots.lock().await;
        Arc::clone(slots.entry(tenant_id).or_default())
    }
}
