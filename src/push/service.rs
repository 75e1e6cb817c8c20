use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use crate::config::ProviderConfig;
use crate::error::{AppError, Result};
use crate::metrics::RequestMetrics;
use crate::registry::RegistrationRegistry;
use crate::telemetry::{self, attributes};

use super::dispatcher::PushDispatcher;
use super::lifecycle::TokenLifecycleManager;
use super::strategy::DeliveryStrategy;
use super::summary::{DeliverySummary, PushResponse};
use super::types::{DeviceRegistration, NotificationRequest};

/// One send request, end to end: registry lookup, credential, fan-out, summary.
pub struct PushService {
    registry: Arc<dyn RegistrationRegistry>,
    strategy: DeliveryStrategy,
    dispatcher: PushDispatcher,
}

impl PushService {
    pub fn new(
        registry: Arc<dyn RegistrationRegistry>,
        strategy: DeliveryStrategy,
        client: reqwest::Client,
        config: &ProviderConfig,
    ) -> Self {
        let lifecycle = Arc::new(TokenLifecycleManager::new(registry.clone()));
        let dispatcher =
            PushDispatcher::new(client, strategy.wire().clone(), lifecycle).with_limits(config);

        Self {
            registry,
            strategy,
            dispatcher,
        }
    }

    pub fn registry(&self) -> &Arc<dyn RegistrationRegistry> {
        &self.registry
    }

    pub fn strategy(&self) -> &DeliveryStrategy {
        &self.strategy
    }

    #[tracing::instrument(
        name = "push.send",
        skip(self, request),
        fields(user_id = %request.user_id, invocation_id = %Uuid::new_v4())
    )]
    pub async fn send(&self, request: NotificationRequest) -> Result<PushResponse> {
        let result = self.run(request).await;
        match &result {
            Ok(PushResponse::NoDevices { .. }) => RequestMetrics::record_no_devices(),
            Ok(PushResponse::Summary(_)) => RequestMetrics::record_sent(),
            Err(_) => RequestMetrics::record_error(),
        }
        result
    }

    async fn run(&self, request: NotificationRequest) -> Result<PushResponse> {
        if request.user_id.trim().is_empty() {
            return Err(AppError::InvalidRequest("user_id must not be empty".to_string()));
        }

        let registrations = self.registry.active_registrations(&request.user_id).await?;
        let registrations = unique_active(registrations);

        if registrations.is_empty() {
            tracing::info!(user_id = %request.user_id, "No active registrations for user");
            return Ok(PushResponse::no_devices());
        }

        // Endpoint first: it needs no I/O, the credential may need a token exchange
        let endpoint = self.strategy.wire().endpoint()?;
        let credential = self.strategy.credentials().acquire().await?;

        let results = self
            .dispatcher
            .dispatch(&credential, &endpoint, &request, registrations)
            .await;
        let summary = DeliverySummary::from_results(results);

        telemetry::record_on_current_span([
            attributes::wire_format(self.strategy.name()),
            attributes::sent_count(summary.sent),
            attributes::total_count(summary.total),
        ]);

        tracing::info!(
            user_id = %request.user_id,
            sent = summary.sent,
            total = summary.total,
            "Push notifications sent"
        );

        Ok(PushResponse::Summary(summary))
    }
}

/// Drop inactive rows and repeated tokens, keeping first occurrence order.
fn unique_active(registrations: Vec<DeviceRegistration>) -> Vec<DeviceRegistration> {
    let mut seen = HashSet::new();
    registrations
        .into_iter()
        .filter(|r| r.is_active && seen.insert(r.token.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::push::Platform;
    use crate::registry::MemoryRegistry;

    #[test]
    fn test_unique_active() {
        let mut inactive = DeviceRegistration::active("c", Platform::Web);
        inactive.is_active = false;

        let unique = unique_active(vec![
            DeviceRegistration::active("a", Platform::Ios),
            DeviceRegistration::active("b", Platform::Android),
            DeviceRegistration::active("a", Platform::Ios),
            inactive,
        ]);
        let tokens: Vec<&str> = unique.iter().map(|r| r.token.as_str()).collect();
        assert_eq!(tokens, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_empty_user_id_is_rejected() {
        let config = ProviderConfig::default();
        let service = PushService::new(
            Arc::new(MemoryRegistry::new()),
            DeliveryStrategy::legacy(Some("key".into()), "http://127.0.0.1:9/fcm/send"),
            reqwest::Client::new(),
            &config,
        );

        let result = service.send(NotificationRequest::new("  ", "Hi", "there")).await;
        assert!(matches!(result, Err(AppError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_no_devices_skips_credentials() {
        // No server key: acquiring a credential would fail, so success proves it was skipped
        let config = ProviderConfig::default();
        let service = PushService::new(
            Arc::new(MemoryRegistry::new()),
            DeliveryStrategy::legacy(None, "http://127.0.0.1:9/fcm/send"),
            reqwest::Client::new(),
            &config,
        );

        let response = service
            .send(NotificationRequest::new("u1", "Hi", "there"))
            .await
            .unwrap();
        assert!(matches!(response, PushResponse::NoDevices { .. }));
        assert_eq!(response.sent(), 0);
    }
}
