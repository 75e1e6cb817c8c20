use std::sync::Arc;

use crate::config::Settings;
use crate::error::{AppError, Result};
use crate::push::{DeliveryStrategy, PushService};
use crate::registry::{create_registry, RegistrationRegistry};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub push_service: Arc<PushService>,
}

impl AppState {
    /// Build the registry, the delivery strategy and the push service from settings.
    pub async fn new(settings: Settings) -> Result<Self> {
        let client = build_http_client()?;
        let registry = create_registry(&settings.registry, client.clone()).await?;
        let strategy = DeliveryStrategy::from_settings(&settings.provider, client.clone())?;

        tracing::info!(
            registry = registry.backend_type(),
            provider = strategy.name(),
            "Push service configured"
        );

        Ok(Self::with_parts(settings, registry, strategy, client))
    }

    /// Assemble state from already-built collaborators.
    pub fn with_parts(
        settings: Settings,
        registry: Arc<dyn RegistrationRegistry>,
        strategy: DeliveryStrategy,
        client: reqwest::Client,
    ) -> Self {
        let push_service = Arc::new(PushService::new(
            registry,
            strategy,
            client,
            &settings.provider,
        ));

        Self {
            settings: Arc::new(settings),
            push_service,
        }
    }
}

fn build_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AppError::Internal(format!("failed to build HTTP client: {}", e)))
}
