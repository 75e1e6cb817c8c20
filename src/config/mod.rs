mod settings;

pub use settings::{
    ApiConfig, OtelConfig, ProviderConfig, ProviderMode, RegistryConfig, ServerConfig, Settings,
};
