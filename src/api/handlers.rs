use axum::{body::Bytes, extract::State, Json};

use crate::error::{AppError, Result};
use crate::push::{NotificationRequest, PushResponse};
use crate::server::AppState;

/// Send a notification to every active device of a user
///
/// The body is parsed as JSON whatever `Content-Type` says; browsers posting
/// a string body send `text/plain`.
#[tracing::instrument(name = "http.send_push", skip_all, fields(body_bytes = body.len()))]
pub async fn send_push(State(state): State<AppState>, body: Bytes) -> Result<Json<PushResponse>> {
    let request = parse_request(&body)?;

    let response = state.push_service.send(request).await?;
    Ok(Json(response))
}

fn parse_request(body: &[u8]) -> Result<NotificationRequest> {
    serde_json::from_slice(body)
        .map_err(|e| AppError::InvalidRequest(format!("invalid request body: {}", e)))
}

/// CORS preflight without the Access-Control-Request-Method header
pub async fn preflight() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request_defaults_data() {
        let request = parse_request(br#"{"user_id":"u1","title":"Hi","body":"there"}"#).unwrap();
        assert_eq!(request.user_id, "u1");
        assert!(request.data.is_empty());
    }

    #[test]
    fn test_parse_request_rejects_bad_input() {
        assert!(matches!(
            parse_request(b"{ not json"),
            Err(AppError::InvalidRequest(_))
        ));
        assert!(matches!(
            parse_request(br#"{"user_id":"u1","title":"Hi"}"#),
            Err(AppError::InvalidRequest(_))
        ));
    }
}
