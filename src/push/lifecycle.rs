//! Registration lifecycle: the single `active -> inactive` transition.

use std::sync::Arc;

use crate::metrics::LifecycleMetrics;
use crate::registry::RegistrationRegistry;

use super::types::token_prefix;

pub struct TokenLifecycleManager {
    registry: Arc<dyn RegistrationRegistry>,
}

impl TokenLifecycleManager {
    pub fn new(registry: Arc<dyn RegistrationRegistry>) -> Self {
        Self { registry }
    }

    /// Mark `token` inactive after the provider reported it permanently invalid.
    ///
    /// Registry failures are logged and swallowed. Returns whether the
    /// registry acknowledged the update.
    pub async fn deactivate(&self, token: &str) -> bool {
        match self.registry.deactivate(token).await {
            Ok(()) => {
                LifecycleMetrics::record_deactivated();
                tracing::info!(
                    token = %token_prefix(token),
                    "Marked registration as inactive"
                );
                true
            }
            Err(e) => {
                LifecycleMetrics::record_deactivation_failed();
                tracing::warn!(
                    token = %token_prefix(token),
                    error = %e,
                    "Failed to deactivate registration"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::push::{DeviceRegistration, Platform};
    use crate::registry::{MemoryRegistry, RegistryError};
    use async_trait::async_trait;

    struct BrokenRegistry;

    #[async_trait]
    impl RegistrationRegistry for BrokenRegistry {
        fn backend_type(&self) -> &'static str {
            "broken"
        }

        async fn active_registrations(
            &self,
            _user_id: &str,
        ) -> Result<Vec<DeviceRegistration>, RegistryError> {
            Ok(vec![])
        }

        async fn deactivate(&self, _token: &str) -> Result<(), RegistryError> {
            Err(RegistryError::Unavailable("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_deactivate_marks_inactive() {
        let registry = Arc::new(MemoryRegistry::new());
        registry.register("u1", "dead", Platform::Android);
        let manager = TokenLifecycleManager::new(registry.clone());

        assert!(manager.deactivate("dead").await);
        assert!(manager.deactivate("dead").await);
        assert_eq!(registry.is_active("dead"), Some(false));
    }

    #[tokio::test]
    async fn test_registry_failure_is_swallowed() {
        let manager = TokenLifecycleManager::new(Arc::new(BrokenRegistry));
        assert!(!manager.deactivate("dead").await);
    }
}
