//! Local configuration storage.
//!
//! Provides both an in-memory store (for testing) and a PostgreSQL-backed
//! store for production use. The store is deliberately dumb: it returns
//! whatever rows exist for a tenant and leaves the single-row invariant to
//! the repository layer, so tests can seed inconsistent states directly.

use crate::error::{SsoError, SsoResult};
use crate::models::{SamlBinding, TenantConfiguration};
use async_trait::async_trait;
use fedgate_core::TenantId;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Row-level access to tenant configuration records.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Return every configuration row for a tenant, in insertion order.
    async fn rows_for_tenant(&self, tenant_id: TenantId) -> SsoResult<Vec<TenantConfiguration>>;

    /// Insert a new row, assigning its identifier.
    async fn insert(
        &self,
        tenant_id: TenantId,
        config: TenantConfiguration,
    ) -> SsoResult<TenantConfiguration>;

    /// Update an existing row by its identifier.
    async fn update(
        &self,
        tenant_id: TenantId,
        config: TenantConfiguration,
    ) -> SsoResult<TenantConfiguration>;
}

/// Database row shape for `tenant_sso_configurations`.
#[derive(Debug, sqlx::FromRow)]
struct PgConfigRow {
    id: Uuid,
    idp_url: Option<String>,
    keystore_blob: Option<String>,
    keystore_password: Option<String>,
    private_key_password: Option<String>,
    binding: String,
    saml_attribute: Option<String>,
    user_property: Option<String>,
    idp_metadata: Option<String>,
    callback_path: Option<String>,
    base_url: Option<String>,
    metadata_invalidated: bool,
    legacy_entry_ids: Vec<String>,
}

impl From<PgConfigRow> for TenantConfiguration {
    fn from(row: PgConfigRow) -> Self {
        TenantConfiguration {
            id: Some(row.id),
            idp_url: row.idp_url,
            keystore_blob: row.keystore_blob,
            keystore_password: row.keystore_password,
            private_key_password: row.private_key_password,
            binding: SamlBinding::parse(&row.binding),
            saml_attribute: row.saml_attribute,
            user_property: row.user_property,
            idp_metadata: row.idp_metadata,
            callback_path: row.callback_path,
            base_url: row.base_url,
            metadata_invalidated: row.metadata_invalidated,
            legacy_entry_ids: row.legacy_entry_ids,
        }
    }
}

/// PostgreSQL-backed configuration store.
pub struct PgConfigStore {
    pool: PgPool,
}

impl PgConfigStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Run this crate's schema migrations.
///
/// Migrations are embedded at compile time from the `migrations/`
/// directory.
pub async fn run_migrations(pool: &PgPool) -> SsoResult<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| SsoError::Internal(format!("Migration failed: {e}")))?;
    tracing::info!("SSO configuration schema migrations completed");
    Ok(())
}

#[async_trait]
impl ConfigStore for PgConfigStore {
    async fn rows_for_tenant(&self, tenant_id: TenantId) -> SsoResult<Vec<TenantConfiguration>> {
        let rows = sqlx::query_as::<_, PgConfigRow>(
            r"
            SELECT id, idp_url, keystore_blob, keystore_password,
                   private_key_password, binding, saml_attribute,
                   user_property, idp_metadata, callback_path, base_url,
                   metadata_invalidated, legacy_entry_ids
            FROM tenant_sso_configurations
            WHERE tenant_id = $1
            ORDER BY created_at ASC
            ",
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(TenantConfiguration::from).collect())
    }

    async fn insert(
        &self,
        tenant_id: TenantId,
        config: TenantConfiguration,
    ) -> SsoResult<TenantConfiguration> {
        let row = sqlx::query_as::<_, PgConfigRow>(
            r"
            INSERT INTO tenant_sso_configurations
                (tenant_id, idp_url, keystore_blob, keystore_password,
                 private_key_password, binding, saml_attribute, user_property,
                 idp_metadata, callback_path, base_url, metadata_invalidated,
                 legacy_entry_ids)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id, idp_url, keystore_blob, keystore_password,
                      private_key_password, binding, saml_attribute,
                      user_property, idp_metadata, callback_path, base_url,
                      metadata_invalidated, legacy_entry_ids
            ",
        )
        .bind(tenant_id.as_uuid())
        .bind(&config.idp_url)
        .bind(&config.keystore_blob)
        .bind(&config.keystore_password)
        .bind(&config.private_key_password)
        .bind(config.binding.to_string())
        .bind(&config.saml_attribute)
        .bind(&config.user_property)
        .bind(&config.idp_metadata)
        .bind(&config.callback_path)
        .bind(&config.base_url)
        .bind(config.metadata_invalidated)
        .bind(&config.legacy_entry_ids)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn update(
        &self,
        tenant_id: TenantId,
        config: TenantConfiguration,
    ) -> SsoResult<TenantConfiguration> {
        let id = config.id.ok_or_else(|| {
            SsoError::Internal("update called on a configuration without an id".to_string())
        })?;

        let row = sqlx::query_as::<_, PgConfigRow>(
            r"
            UPDATE tenant_sso_configurations
            SET idp_url = $3, keystore_blob = $4, keystore_password = $5,
                private_key_password = $6, binding = $7, saml_attribute = $8,
                user_property = $9, idp_metadata = $10, callback_path = $11,
                base_url = $12, metadata_invalidated = $13,
                legacy_entry_ids = $14, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING id, idp_url, keystore_blob, keystore_password,
                      private_key_password, binding, saml_attribute,
                      user_property, idp_metadata, callback_path, base_url,
                      metadata_invalidated, legacy_entry_ids
            ",
        )
        .bind(id)
        .bind(tenant_id.as_uuid())
        .bind(&config.idp_url)
        .bind(&config.keystore_blob)
        .bind(&config.keystore_password)
        .bind(&config.private_key_password)
        .bind(config.binding.to_string())
        .bind(&config.saml_attribute)
        .bind(&config.user_property)
        .bind(&config.idp_metadata)
        .bind(&config.callback_path)
        .bind(&config.base_url)
        .bind(config.metadata_invalidated)
        .bind(&config.legacy_entry_ids)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(SsoError::ConfigNotFound)?;

        Ok(row.into())
    }
}

/// In-memory configuration store for testing.
///
/// Tracks read and write counts so tests can assert on IO behavior (cache
/// hits perform zero reads, gated generation performs zero writes), and
/// allows seeding duplicate rows to exercise the ambiguity path.
#[derive(Debug, Default)]
pub struct InMemoryConfigStore {
    rows: Arc<RwLock<HashMap<TenantId, Vec<TenantConfiguration>>>>,
    reads: AtomicU64,
    writes: AtomicU64,
}

impl InMemoryConfigStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a row for a tenant directly, bypassing the repository. The row
    /// is given an id if it has none.
    pub async fn seed_row(&self, tenant_id: TenantId, mut config: TenantConfiguration) {
        if config.id.is_none() {
            config.id = Some(Uuid::new_v4());
        }
        self.rows
            .write()
            .await
            .entry(tenant_id)
            .or_default()
            .push(config);
    }

    /// Number of `rows_for_tenant` calls served.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of insert/update calls served.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfigStore for InMemoryConfigStore {
    async fn rows_for_tenant(&self, tenant_id: TenantId) -> SsoResult<Vec<TenantConfiguration>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows.read().await;
        Ok(rows.get(&tenant_id).cloned().unwrap_or_default())
    }

    async fn insert(
        &self,
        tenant_id: TenantId,
        mut config: TenantConfiguration,
    ) -> SsoResult<TenantConfiguration> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        config.id = Some(Uuid::new_v4());
        let mut rows = self.rows.write().await;
        rows.entry(tenant_id).or_default().push(config.clone());
        Ok(config)
    }

    async fn update(
        &self,
        tenant_id: TenantId,
        config: TenantConfiguration,
    ) -> SsoResult<TenantConfiguration> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let id = config.id.ok_or_else(|| {
            SsoError::Internal("update called on a configuration without an id".to_string())
        })?;

        let mut rows = self.rows.write().await;
        let tenant_rows = rows.get_mut(&tenant_id).ok_or(SsoError::ConfigNotFound)?;
        let slot = tenant_rows
            .iter_mut()
            .find(|row| row.id == Some(id))
            .ok_or(SsoError::ConfigNotFound)?;
        *slot = config.clone();
        Ok(config)
    }
}
