use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub otel: OtelConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
    /// Shared key expected in `X-API-Key`; unset disables the check
    pub key: Option<String>,
}

/// Which FCM wire API (and matching credential scheme) this deployment uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderMode {
    /// Legacy HTTP API, `Authorization: key=<server key>`
    Legacy,
    /// HTTP v1 API, OAuth2 bearer minted from a service account
    Modern,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_mode")]
    pub mode: ProviderMode,
    /// Legacy server key
    pub server_key: Option<String>,
    /// Service account JSON document (as downloaded from the Firebase console)
    pub service_account: Option<String>,
    /// Path to a service account JSON file, used when `service_account` is unset
    pub service_account_file: Option<String>,
    /// Overrides the project id taken from the service account
    pub project_id: Option<String>,
    #[serde(default = "default_legacy_endpoint")]
    pub legacy_endpoint: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_token_endpoint")]
    pub token_endpoint: String,
    #[serde(default = "default_scope")]
    pub scope: String,
    /// Per-send timeout in seconds; unset leaves the HTTP client default
    pub request_timeout_seconds: Option<u64>,
    /// Upper bound on in-flight sends per request; unset means unbounded
    pub max_concurrent_sends: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    /// `memory`, `postgres` or `postgrest`
    #[serde(default = "default_registry_backend")]
    pub backend: String,
    #[serde(default = "default_registry_table")]
    pub table: String,
    /// SQL type of the `user_id` column; the bound id is cast to it
    #[serde(default = "default_user_id_type")]
    pub user_id_type: String,
    pub database_url: Option<String>,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    /// Base URL of the PostgREST / Supabase project
    pub rest_url: Option<String>,
    /// Service role key for PostgREST
    pub service_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtelConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_otel_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_sampling_ratio")]
    pub sampling_ratio: f64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8081
}

fn default_provider_mode() -> ProviderMode {
    ProviderMode::Modern
}

fn default_legacy_endpoint() -> String {
    "https://fcm.googleapis.com/fcm/send".to_string()
}

fn default_api_base_url() -> String {
    "https://fcm.googleapis.com".to_string()
}

fn default_token_endpoint() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn default_scope() -> String {
    "https://www.googleapis.com/auth/firebase.messaging".to_string()
}

fn default_registry_backend() -> String {
    "memory".to_string()
}

fn default_registry_table() -> String {
    "fcm_tokens".to_string()
}

fn default_user_id_type() -> String {
    "uuid".to_string()
}

fn default_pool_size() -> u32 {
    5
}

fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_service_name() -> String {
    "push-notification-service".to_string()
}

fn default_sampling_ratio() -> f64 {
    1.0
}

/// Unprefixed variables understood for existing Firebase/Supabase deployments.
const LEGACY_ENV_OVERRIDES: &[(&str, &str)] = &[
    ("FIREBASE_SERVICE_ACCOUNT", "provider.service_account"),
    ("FCM_SERVER_KEY", "provider.server_key"),
    ("SUPABASE_URL", "registry.rest_url"),
    ("SUPABASE_SERVICE_ROLE_KEY", "registry.service_key"),
    ("DATABASE_URL", "registry.database_url"),
    ("PORT", "server.port"),
];

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8081)?
            .set_default("provider.mode", "modern")?
            .set_default("registry.backend", "memory")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // APP__PROVIDER__MODE, APP__REGISTRY__BACKEND, ...
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        for (var, key) in LEGACY_ENV_OVERRIDES {
            builder = builder.set_override_option(*key, env::var(var).ok())?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            mode: default_provider_mode(),
            server_key: None,
            service_account: None,
            service_account_file: None,
            project_id: None,
            legacy_endpoint: default_legacy_endpoint(),
            api_base_url: default_api_base_url(),
            token_endpoint: default_token_endpoint(),
            scope: default_scope(),
            request_timeout_seconds: None,
            max_concurrent_sends: None,
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            backend: default_registry_backend(),
            table: default_registry_table(),
            user_id_type: default_user_id_type(),
            database_url: None,
            pool_size: default_pool_size(),
            rest_url: None,
            service_key: None,
        }
    }
}

impl Default for OtelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_otel_endpoint(),
            service_name: default_service_name(),
            sampling_ratio: default_sampling_ratio(),
        }
    }
}
