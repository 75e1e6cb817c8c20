//! API layer - HTTP endpoint handlers.

mod handlers;
mod health;
mod metrics;
mod routes;

pub use handlers::{preflight, send_push};
pub use health::health;
pub use metrics::prometheus_metrics;
pub use routes::api_routes;
