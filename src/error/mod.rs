use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::registry::RegistryError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Missing secret, identity record or project id
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable code, used in logs and metrics labels.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) | AppError::Configuration(_) => "CONFIG_ERROR",
            AppError::Credential(_) => "CREDENTIAL_ERROR",
            AppError::Registry(_) => "REGISTRY_ERROR",
            AppError::InvalidRequest(_) => "INVALID_REQUEST",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Check if running in production mode (based on RUN_MODE env var)
fn is_production() -> bool {
    std::env::var("RUN_MODE")
        .map(|m| m == "production" || m == "prod")
        .unwrap_or(false)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Every request-level failure is a 500; per-device failures never get here.
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        let code = self.code();
        let log_message = self.to_string();

        let client_message = match &self {
            AppError::Config(_) if is_production() => "Configuration error".to_string(),
            AppError::Internal(_) if is_production() => "Internal server error".to_string(),
            AppError::Configuration(msg)
            | AppError::Credential(msg)
            | AppError::InvalidRequest(msg)
            | AppError::Internal(msg) => msg.clone(),
            AppError::Config(e) => e.to_string(),
            AppError::Registry(e) => e.to_string(),
        };

        // Always log the detailed error server-side
        tracing::error!(
            code = %code,
            status = %status.as_u16(),
            message = %log_message,
            "Request failed"
        );

        (
            status,
            Json(ErrorResponse {
                error: client_message,
            }),
        )
            .into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AppError::Configuration("x".into()).code(), "CONFIG_ERROR");
        assert_eq!(AppError::Credential("x".into()).code(), "CREDENTIAL_ERROR");
        assert_eq!(AppError::InvalidRequest("x".into()).code(), "INVALID_REQUEST");
        assert_eq!(
            AppError::Registry(RegistryError::Unavailable("down".into())).code(),
            "REGISTRY_ERROR"
        );
    }

    #[tokio::test]
    async fn test_into_response_is_500_with_error_string() {
        let response =
            AppError::Configuration("FIREBASE_SERVICE_ACCOUNT not configured".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "FIREBASE_SERVICE_ACCOUNT not configured");
    }
}
