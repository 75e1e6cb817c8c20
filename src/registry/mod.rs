//! Device registration registry.
//!
//! The registry is owned by an external service; this module only reads a
//! user's active registrations and flips `is_active` to false on dead ones.
//!
//! - `MemoryRegistry`: DashMap-backed, for development and tests
//! - `PostgresRegistry`: direct SQL against the registrations table
//! - `PostgrestRegistry`: Supabase / PostgREST over HTTP

mod memory_backend;
mod postgres_backend;
mod postgrest_backend;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use crate::config::RegistryConfig;
use crate::error::AppError;
use crate::push::{DeviceRegistration, Platform};

pub use memory_backend::MemoryRegistry;
pub use postgres_backend::PostgresRegistry;
pub use postgrest_backend::PostgrestRegistry;

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Registry returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Registry unavailable: {0}")]
    Unavailable(String),
}

/// Read/deactivate access to device registrations.
#[async_trait]
pub trait RegistrationRegistry: Send + Sync {
    /// Backend type identifier
    fn backend_type(&self) -> &'static str;

    /// All registrations of `user_id` that are currently active
    async fn active_registrations(
        &self,
        user_id: &str,
    ) -> Result<Vec<DeviceRegistration>, RegistryError>;

    /// Set `is_active = false` on `token`. Idempotent; never deletes.
    async fn deactivate(&self, token: &str) -> Result<(), RegistryError>;
}

/// Create a registry backend based on configuration.
///
/// - `"postgres"`: requires `registry.database_url`
/// - `"postgrest"`: requires `registry.rest_url` and `registry.service_key`
/// - `"memory"`: empty in-process registry
pub async fn create_registry(
    settings: &RegistryConfig,
    client: reqwest::Client,
) -> Result<Arc<dyn RegistrationRegistry>, AppError> {
    match settings.backend.as_str() {
        "postgres" => {
            validate_table_name(&settings.table)?;
            validate_user_id_type(&settings.user_id_type)?;
            let url = settings.database_url.as_deref().ok_or_else(|| {
                AppError::Configuration("registry.database_url is required for postgres".into())
            })?;

            let pool = PgPoolOptions::new()
                .max_connections(settings.pool_size)
                .acquire_timeout(Duration::from_secs(10))
                .connect(url)
                .await
                .map_err(|e| AppError::Configuration(format!("cannot connect to registry database: {}", e)))?;

            tracing::info!(
                backend = "postgres",
                table = %settings.table,
                pool_size = settings.pool_size,
                "Creating PostgreSQL registry"
            );
            Ok(Arc::new(PostgresRegistry::new(
                pool,
                settings.table.clone(),
                settings.user_id_type.clone(),
            )))
        }
        "postgrest" => {
            validate_table_name(&settings.table)?;
            let (Some(url), Some(key)) = (&settings.rest_url, &settings.service_key) else {
                return Err(AppError::Configuration(
                    "registry.rest_url and registry.service_key are required for postgrest".into(),
                ));
            };

            tracing::info!(
                backend = "postgrest",
                url = %url,
                table = %settings.table,
                "Creating PostgREST registry"
            );
            Ok(Arc::new(PostgrestRegistry::new(
                client,
                url.clone(),
                key.clone(),
                settings.table.clone(),
            )))
        }
        "memory" => {
            tracing::info!(backend = "memory", "Creating memory registry");
            Ok(Arc::new(MemoryRegistry::new()))
        }
        other => Err(AppError::Configuration(format!(
            "unknown registry backend '{}'",
            other
        ))),
    }
}

/// Plain identifier, optionally schema-qualified.
fn is_sql_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').count() <= 2
        && name.split('.').all(|part| {
            !part.is_empty()
                && !part.starts_with(|c: char| c.is_ascii_digit())
                && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

/// Table names end up in SQL text and URL paths.
pub(crate) fn validate_table_name(name: &str) -> Result<(), AppError> {
    if is_sql_identifier(name) {
        Ok(())
    } else {
        Err(AppError::Configuration(format!(
            "invalid registry table name '{}'",
            name
        )))
    }
}

/// The user id type is spliced into the SELECT as a cast target.
pub(crate) fn validate_user_id_type(name: &str) -> Result<(), AppError> {
    if is_sql_identifier(name) {
        Ok(())
    } else {
        Err(AppError::Configuration(format!(
            "invalid registry user_id_type '{}'",
            name
        )))
    }
}

/// Turn raw `(token, platform)` rows into registrations, skipping rows whose
/// platform is not one we know how to address.
pub(crate) fn registrations_from_rows(
    rows: impl IntoIterator<Item = (String, String)>,
) -> Vec<DeviceRegistration> {
    rows.into_iter()
        .filter_map(|(token, platform)| match platform.parse::<Platform>() {
            Ok(platform) => Some(DeviceRegistration::active(token, platform)),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping registration with unknown platform");
                None
            }
        })
        .collect()
}
