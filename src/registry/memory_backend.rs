//! In-memory registration registry using DashMap.
//!
//! Entries are lost on restart; intended for development and tests.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::push::{DeviceRegistration, Platform};

use super::{RegistrationRegistry, RegistryError};

#[derive(Debug, Clone)]
struct StoredRegistration {
    user_id: String,
    platform: Platform,
    is_active: bool,
}

/// In-memory registry keyed by device token.
#[derive(Default)]
pub struct MemoryRegistry {
    entries: DashMap<String, StoredRegistration>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an active registration.
    pub fn register(&self, user_id: &str, token: &str, platform: Platform) {
        self.entries.insert(
            token.to_string(),
            StoredRegistration {
                user_id: user_id.to_string(),
                platform,
                is_active: true,
            },
        );
    }

    /// `None` if the token is unknown.
    pub fn is_active(&self, token: &str) -> Option<bool> {
        self.entries.get(token).map(|entry| entry.is_active)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl RegistrationRegistry for MemoryRegistry {
    fn backend_type(&self) -> &'static str {
        "memory"
    }

    async fn active_registrations(
        &self,
        user_id: &str,
    ) -> Result<Vec<DeviceRegistration>, RegistryError> {
        let mut registrations: Vec<DeviceRegistration> = self
            .entries
            .iter()
            .filter(|entry| entry.user_id == user_id && entry.is_active)
            .map(|entry| DeviceRegistration::active(entry.key().clone(), entry.platform))
            .collect();

        registrations.sort_by(|a, b| a.token.cmp(&b.token));
        Ok(registrations)
    }

    async fn deactivate(&self, token: &str) -> Result<(), RegistryError> {
        if let Some(mut entry) = self.entries.get_mut(token) {
            entry.is_active = false;
        }
        Ok(())
    }
}
