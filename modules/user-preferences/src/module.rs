use std::sync::Arc;

use axum::Router;
use identity_resolver_sdk::IdentityResolverClient;
use tracing::info;

use crate::api::rest::routes;
use crate::config::PreferencesConfig;
use crate::domain::service::{Service, ServiceConfig};
use crate::infra::storage::InMemoryPreferencesRepository;

/// Type alias for the concrete service type with the in-memory repository.
pub type ConcreteService = Service<InMemoryPreferencesRepository>;

/// Shared state of the preferences routes.
pub struct PreferencesState {
    pub service: Arc<ConcreteService>,
    pub resolver: Arc<dyn IdentityResolverClient>,
}

pub struct PreferencesModule {
    state: Arc<PreferencesState>,
}

impl PreferencesModule {
    #[must_use]
    pub fn new(cfg: &PreferencesConfig, resolver: Arc<dyn IdentityResolverClient>) -> Self {
        info!(max_field_length = cfg.max_field_length, "Initializing preferences module");

        let repo = Arc::new(InMemoryPreferencesRepository::new());
        let service = Arc::new(Service::new(
            repo,
            ServiceConfig {
                max_field_length: cfg.max_field_length,
            },
        ));
        Self {
            state: Arc::new(PreferencesState { service, resolver }),
        }
    }

    #[must_use]
    pub fn service(&self) -> Arc<ConcreteService> {
        Arc::clone(&self.state.service)
    }

    /// Routes to be merged into the gateway router.
    #[must_use]
    pub fn router(&self) -> Router {
        let router = routes::register_routes(Arc::clone(&self.state));
        info!("Preferences module: REST routes registered successfully");
        router
    }
}
