use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::metrics::CredentialMetrics;

use super::{Credential, CredentialProvider, CredentialScheme};

/// Pre-shared legacy server key. No network, no expiry.
pub struct StaticKeyProvider {
    secret: Option<String>,
}

impl StaticKeyProvider {
    pub fn new(secret: Option<String>) -> Self {
        Self { secret }
    }
}

#[async_trait]
impl CredentialProvider for StaticKeyProvider {
    fn scheme(&self) -> CredentialScheme {
        CredentialScheme::StaticKey
    }

    async fn acquire(&self) -> Result<Credential> {
        match self.secret.as_deref().map(str::trim) {
            Some(secret) if !secret.is_empty() => {
                CredentialMetrics::record_acquired(CredentialScheme::StaticKey);
                Ok(Credential::StaticKey {
                    secret: secret.to_string(),
                })
            }
            _ => {
                CredentialMetrics::record_failed(CredentialScheme::StaticKey);
                Err(AppError::Configuration(
                    "FCM server key not configured".to_string(),
                ))
            }
        }
    }
}
