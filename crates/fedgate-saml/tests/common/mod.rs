//! Shared test harness: in-memory configuration store plus a wiremock
//! stand-in for the legacy configuration service.

use std::sync::Arc;
use std::time::Duration;

use fedgate_config_client::LegacyConfigClient;
use fedgate_core::TenantId;
use fedgate_saml::client::{Base64KeystoreSource, CredentialSource};
use fedgate_saml::{
    ClientFactory, ClientRegistry, ConfigRepository, ConfigStore, InMemoryConfigStore,
    MigrationCoordinator,
};
use wiremock::MockServer;

// Not every test binary touches every handle.
#[allow(dead_code)]
pub struct Harness {
    pub tenant: TenantId,
    pub server: MockServer,
    pub store: Arc<InMemoryConfigStore>,
    pub repository: ConfigRepository,
    pub coordinator: MigrationCoordinator,
    pub factory: ClientFactory,
    pub registry: ClientRegistry,
}

impl Harness {
    pub async fn start() -> Self {
        Self::start_with_source(Arc::new(Base64KeystoreSource)).await
    }

    pub async fn start_with_source(source: Arc<dyn CredentialSource>) -> Self {
        let server = MockServer::start().await;
        let store = Arc::new(InMemoryConfigStore::new());
        let repository = ConfigRepository::new(Arc::clone(&store) as Arc<dyn ConfigStore>);

        let legacy = LegacyConfigClient::new(
            server.uri(),
            None,
            Duration::from_secs(1),
            Duration::from_secs(2),
        )
        .unwrap();

        let coordinator = MigrationCoordinator::new(repository.clone(), legacy);
        let factory = ClientFactory::new(repository.clone(), source);
        let registry = ClientRegistry::new(
            repository.clone(),
            coordinator.clone(),
            factory.clone(),
        );

        Self {
            tenant: TenantId::new(),
            server,
            store,
            repository,
            coordinator,
            factory,
            registry,
        }
    }
}
