//! Per-deployment pairing of credential scheme and wire format.

use std::sync::Arc;

use crate::config::{ProviderConfig, ProviderMode};
use crate::credentials::{
    CredentialProvider, ServiceAccount, ServiceAccountProvider, StaticKeyProvider,
};
use crate::error::{AppError, Result};

use super::wire::{LegacyWire, ModernWire, WireFormat};

/// A credential provider together with the wire format it authorizes.
///
/// Only the `legacy` and `modern` constructors exist, so a server key can
/// never be sent to the v1 endpoint or a bearer token to the legacy one.
#[derive(Clone)]
pub struct DeliveryStrategy {
    credentials: Arc<dyn CredentialProvider>,
    wire: Arc<dyn WireFormat>,
}

impl DeliveryStrategy {
    /// Server key + legacy multicast endpoint
    pub fn legacy(server_key: Option<String>, endpoint: impl Into<String>) -> Self {
        Self {
            credentials: Arc::new(StaticKeyProvider::new(server_key)),
            wire: Arc::new(LegacyWire::new(endpoint)),
        }
    }

    /// Service account bearer token + project-scoped v1 endpoint.
    /// `project_id` overrides the one from the service account.
    pub fn modern(
        account: Option<ServiceAccount>,
        project_id: Option<String>,
        config: &ProviderConfig,
        client: reqwest::Client,
    ) -> Self {
        let provider = ServiceAccountProvider::new(
            account,
            config.token_endpoint.clone(),
            config.scope.clone(),
            client,
        );
        let project_id = project_id.or_else(|| provider.project_id().map(str::to_string));

        Self {
            credentials: Arc::new(provider),
            wire: Arc::new(ModernWire::new(config.api_base_url.clone(), project_id)),
        }
    }

    /// Build the strategy selected by `provider.mode`.
    ///
    /// A missing secret or service account is not an error here; it surfaces
    /// as a configuration error when a credential is first needed. A service
    /// account that is present but unreadable fails immediately.
    pub fn from_settings(config: &ProviderConfig, client: reqwest::Client) -> Result<Self> {
        match config.mode {
            ProviderMode::Legacy => Ok(Self::legacy(
                config.server_key.clone(),
                config.legacy_endpoint.clone(),
            )),
            ProviderMode::Modern => {
                let account = load_service_account(config)?;
                if account.is_none() {
                    tracing::warn!("No service account configured; sends will fail until one is provided");
                }
                Ok(Self::modern(
                    account,
                    config.project_id.clone(),
                    config,
                    client,
                ))
            }
        }
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialProvider> {
        &self.credentials
    }

    pub fn wire(&self) -> &Arc<dyn WireFormat> {
        &self.wire
    }

    pub fn name(&self) -> &'static str {
        self.wire.name()
    }
}

fn load_service_account(config: &ProviderConfig) -> Result<Option<ServiceAccount>> {
    if let Some(json) = config.service_account.as_deref().filter(|s| !s.trim().is_empty()) {
        return ServiceAccount::from_json(json).map(Some);
    }

    if let Some(path) = config.service_account_file.as_deref() {
        let json = std::fs::read_to_string(path).map_err(|e| {
            AppError::Configuration(format!("cannot read service account file {}: {}", path, e))
        })?;
        return ServiceAccount::from_json(&json).map(Some);
    }

    Ok(None)
}
