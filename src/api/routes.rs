use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, MethodRouter},
    Router,
};

use crate::server::{api_key_auth, AppState};

use super::{health, preflight, prometheus_metrics, send_push};

pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health & Metrics
        .route("/health", get(health))
        .route("/metrics", get(prometheus_metrics))
        // Send: the function root and a versioned alias
        .route("/", send_route(&state))
        .route("/api/v1/push/send", send_route(&state))
}

/// POST is key-checked; OPTIONS stays open so browsers can preflight.
fn send_route(state: &AppState) -> MethodRouter<AppState> {
    post(send_push)
        .layer(from_fn_with_state(state.clone(), api_key_auth))
        .options(preflight)
}
