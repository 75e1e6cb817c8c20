// Shared infrastructure
pub mod config;
pub mod error;
pub mod metrics;
pub mod telemetry;

// Delivery core
pub mod credentials;
pub mod push;
pub mod registry;

// HTTP surface
pub mod api;
pub mod server;
