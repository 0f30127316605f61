//! Client registry tests: cache behavior, invalidation, single-flight
//! loads, migration fallback.

mod common;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use common::Harness;
use fedgate_saml::{SsoError, TenantConfiguration};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

/// A configuration a client can be built from without any generation.
fn buildable_config() -> TenantConfiguration {
    TenantConfiguration {
        idp_url: Some("https://idp.example.com".to_string()),
        keystore_blob: Some(BASE64.encode(b"keystore-bytes")),
        keystore_password: Some("ks-pass".to_string()),
        private_key_password: Some("pk-pass".to_string()),
        base_url: Some("https://gw.example.com".to_string()),
        ..TenantConfiguration::default()
    }
}

#[tokio::test]
async fn second_lookup_is_served_from_cache_without_io() {
    let h = Harness::start().await;
    h.store.seed_row(h.tenant, buildable_config()).await;

    let first = h.registry.find_or_load(h.tenant, false).await.unwrap();
    let reads_after_load = h.store.reads();

    let second = h.registry.find_or_load(h.tenant, false).await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(
        h.store.reads(),
        reads_after_load,
        "cache hit must not touch the store"
    );
    // No legacy traffic at any point: nothing was mounted, and wiremock
    // returns 404 for unexpected requests, which would have failed the load.
}

#[tokio::test]
async fn invalidate_forces_a_fresh_load() {
    let h = Harness::start().await;
    h.store.seed_row(h.tenant, buildable_config()).await;

    let first = h.registry.find_or_load(h.tenant, false).await.unwrap();
    h.registry.invalidate(h.tenant).await;

    let reads_before = h.store.reads();
    let second = h.registry.find_or_load(h.tenant, false).await.unwrap();

    assert!(h.store.reads() > reads_before, "reload must re-read the store");
    assert!(!Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn failed_load_is_not_cached() {
    let h = Harness::start().await;
    // Row exists but is unusable: no IdP URL.
    let mut config = buildable_config();
    config.idp_url = None;
    h.store.seed_row(h.tenant, config).await;

    let err = h.registry.find_or_load(h.tenant, false).await.unwrap_err();
    assert!(matches!(err, SsoError::MissingIdpUrl));
    let reads_after_failure = h.store.reads();

    // The next call retries from scratch instead of serving the failure.
    let err = h.registry.find_or_load(h.tenant, false).await.unwrap_err();
    assert!(matches!(err, SsoError::MissingIdpUrl));
    assert!(h.store.reads() > reads_after_failure);
}

#[tokio::test]
async fn cache_miss_with_no_local_row_migrates_from_legacy() {
    let h = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/configurations/entries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "configs": [
                {"id": "A", "code": "idp.url", "value": "https://idp.example.com"},
                {"id": "B", "code": "keystore.file", "value": BASE64.encode(b"legacy-keystore")},
                {"id": "C", "code": "keystore.password", "value": "legacy-pass"}
            ],
            "totalRecords": 3
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let client = h.registry.find_or_load(h.tenant, false).await.unwrap();
    assert_eq!(client.idp_url(), "https://idp.example.com");
    assert_eq!(client.credentials().keystore, b"legacy-keystore");

    // Migration persisted a local row; the registry cached the client.
    assert!(h.repository.get(h.tenant, false).await.is_ok());
    let again = h.registry.find_or_load(h.tenant, false).await.unwrap();
    assert!(Arc::ptr_eq(&client, &again));
}

#[tokio::test]
async fn registry_propagates_ambiguous_state() {
    let h = Harness::start().await;
    h.store.seed_row(h.tenant, buildable_config()).await;
    h.store.seed_row(h.tenant, buildable_config()).await;

    let err = h.registry.find_or_load(h.tenant, false).await.unwrap_err();
    assert!(matches!(err, SsoError::AmbiguousConfigState { count: 2 }));
}

#[tokio::test]
async fn concurrent_misses_coalesce_into_one_load() {
    let h = Harness::start().await;
    h.store.seed_row(h.tenant, buildable_config()).await;
    let registry = Arc::new(h.registry);
    let tenant = h.tenant;

    let (a, b) = tokio::join!(
        {
            let registry = Arc::clone(&registry);
            async move { registry.find_or_load(tenant, false).await }
        },
        {
            let registry = Arc::clone(&registry);
            async move { registry.find_or_load(tenant, false).await }
        }
    );

    let a = a.unwrap();
    let b = b.unwrap();
    assert!(Arc::ptr_eq(&a, &b), "both callers get the same handle");
    assert_eq!(
        h.store.reads(),
        1,
        "two concurrent misses must provoke exactly one load"
    );
}

#[tokio::test]
async fn cached_config_snapshot_tracks_the_built_client() {
    let h = Harness::start().await;
    h.store.seed_row(h.tenant, buildable_config()).await;

    assert!(h.registry.cached_config(h.tenant).await.is_none());

    h.registry.find_or_load(h.tenant, false).await.unwrap();
    let snapshot = h.registry.cached_config(h.tenant).await.unwrap();
    assert_eq!(snapshot.idp_url.as_deref(), Some("https://idp.example.com"));

    h.registry.invalidate(h.tenant).await;
    assert!(h.registry.cached_config(h.tenant).await.is_none());
}

#[tokio::test]
async fn snapshot_reflects_generated_key_material() {
    let h = Harness::start().await;
    // Usable IdP configuration, but no key material yet.
    let mut config = buildable_config();
    config.keystore_blob = None;
    config.keystore_password = None;
    config.private_key_password = None;
    h.store.seed_row(h.tenant, config).await;

    let client = h.registry.find_or_load(h.tenant, true).await.unwrap();

    // Generation persisted fresh material; the snapshot must describe the
    // stored row, not the pre-generation read.
    let snapshot = h.registry.cached_config(h.tenant).await.unwrap();
    let stored = h.repository.get(h.tenant, false).await.unwrap();
    assert!(snapshot.content_eq(&stored));
    assert!(snapshot.metadata_invalidated);
    assert_eq!(
        snapshot.keystore_blob.as_deref().map(|b| BASE64.decode(b).unwrap()),
        Some(client.credentials().keystore.clone())
    );
}

#[tokio::test]
async fn tenants_are_cached_independently() {
    let h = Harness::start().await;
    let other = fedgate_core::TenantId::new();
    h.store.seed_row(h.tenant, buildable_config()).await;
    h.store.seed_row(other, buildable_config()).await;

    let a = h.registry.find_or_load(h.tenant, false).await.unwrap();
    let b = h.registry.find_or_load(other, false).await.unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(a.tenant_id(), h.tenant);
    assert_eq!(b.tenant_id(), other);

    // Invalidating one tenant leaves the other cached.
    h.registry.invalidate(h.tenant).await;
    let b_again = h.registry.find_or_load(other, false).await.unwrap();
    assert!(Arc::ptr_eq(&b, &b_again));
}
