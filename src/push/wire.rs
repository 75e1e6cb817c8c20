//! FCM wire formats.
//!
//! Each format knows its endpoint, how to render a notification for one
//! device token, and how to read the provider's verdict from a response.
//! The two formats have different success predicates: the legacy API can
//! answer HTTP 200 while reporting a per-message failure in the body.

use reqwest::StatusCode;
use serde_json::{json, Map, Value};

use crate::error::{AppError, Result};

use super::types::NotificationRequest;

pub const CLICK_ACTION: &str = "FLUTTER_NOTIFICATION_CLICK";
pub const ANDROID_CHANNEL_ID: &str = "high_importance_channel";

/// Legacy error codes meaning the token will never work again
pub const LEGACY_PERMANENT_CODES: &[&str] = &["NotRegistered", "InvalidRegistration"];

/// HTTP v1 error codes meaning the token will never work again
pub const MODERN_PERMANENT_CODES: &[&str] = &["UNREGISTERED", "INVALID_ARGUMENT"];

/// Classification of one provider response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Delivered,
    /// Registration is dead; carries the provider's error code
    Permanent(String),
    /// Anything else; carries a short reason
    Transient(String),
}

pub trait WireFormat: Send + Sync {
    fn name(&self) -> &'static str;

    /// Send endpoint; fails if the deployment lacks what the URL needs.
    fn endpoint(&self) -> Result<String>;

    fn build_payload(&self, token: &str, request: &NotificationRequest) -> Value;

    fn classify(&self, status: StatusCode, body: &Value) -> Verdict;
}

fn data_with_click_action(data: &Map<String, Value>) -> Value {
    let mut data = data.clone();
    data.insert("click_action".to_string(), json!(CLICK_ACTION));
    Value::Object(data)
}

fn verdict_from_code(code: Option<&str>, permanent: &[&str], status: StatusCode) -> Verdict {
    match code {
        Some(code) if permanent.contains(&code) => Verdict::Permanent(code.to_string()),
        Some(code) => Verdict::Transient(code.to_string()),
        None if !status.is_success() => Verdict::Transient(format!("HTTP {}", status.as_u16())),
        None => Verdict::Transient("provider did not confirm delivery".to_string()),
    }
}

/// Legacy HTTP API (`/fcm/send`, server key auth).
pub struct LegacyWire {
    endpoint: String,
}

impl LegacyWire {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl WireFormat for LegacyWire {
    fn name(&self) -> &'static str {
        "legacy"
    }

    fn endpoint(&self) -> Result<String> {
        Ok(self.endpoint.clone())
    }

    fn build_payload(&self, token: &str, request: &NotificationRequest) -> Value {
        json!({
            "to": token,
            "notification": {
                "title": request.title,
                "body": request.body,
                "sound": "default",
                "badge": "1",
            },
            "data": data_with_click_action(&request.data),
            "priority": "high",
            "content_available": true,
        })
    }

    fn classify(&self, status: StatusCode, body: &Value) -> Verdict {
        let reported_success = body.get("success").and_then(Value::as_i64) == Some(1);
        if status.is_success() && reported_success {
            return Verdict::Delivered;
        }

        let code = body
            .get("results")
            .and_then(|results| results.get(0))
            .and_then(|result| result.get("error"))
            .and_then(Value::as_str);

        verdict_from_code(code, LEGACY_PERMANENT_CODES, status)
    }
}

/// HTTP v1 API (`/v1/projects/{id}/messages:send`, OAuth2 bearer auth).
pub struct ModernWire {
    api_base_url: String,
    project_id: Option<String>,
}

impl ModernWire {
    pub fn new(api_base_url: impl Into<String>, project_id: Option<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            project_id,
        }
    }
}

impl WireFormat for ModernWire {
    fn name(&self) -> &'static str {
        "modern"
    }

    fn endpoint(&self) -> Result<String> {
        let project_id = self
            .project_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::Configuration("FCM project id not configured".to_string()))?;

        Ok(format!(
            "{}/v1/projects/{}/messages:send",
            self.api_base_url.trim_end_matches('/'),
            project_id
        ))
    }

    fn build_payload(&self, token: &str, request: &NotificationRequest) -> Value {
        json!({
            "message": {
                "token": token,
                "notification": {
                    "title": request.title,
                    "body": request.body,
                },
                "data": data_with_click_action(&request.data),
                "android": {
                    "priority": "high",
                    "notification": {
                        "sound": "default",
                        "channel_id": ANDROID_CHANNEL_ID,
                    },
                },
                "apns": {
                    "payload": {
                        "aps": {
                            "sound": "default",
                            "badge": 1,
                            "content-available": 1,
                        },
                    },
                },
            },
        })
    }

    fn classify(&self, status: StatusCode, body: &Value) -> Verdict {
        if status.is_success() {
            return Verdict::Delivered;
        }

        let error = body.get("error");
        // Only the first detail entry is consulted, then `error.status`
        let code = error
            .and_then(|e| e.get("details"))
            .and_then(Value::as_array)
            .and_then(|details| details.first())
            .and_then(|detail| detail.get("errorCode"))
            .and_then(Value::as_str)
            .or_else(|| error.and_then(|e| e.get("status")).and_then(Value::as_str));

        verdict_from_code(code, MODERN_PERMANENT_CODES, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> NotificationRequest {
        NotificationRequest::new("u1", "Hi", "there")
            .with_data("order_id", "42")
            .with_data("click_action", "OVERRIDDEN")
    }

    #[test]
    fn test_legacy_payload_shape() {
        let payload = LegacyWire::new("https://fcm.googleapis.com/fcm/send")
            .build_payload("tok-1", &request());

        assert_eq!(payload["to"], "tok-1");
        assert_eq!(payload["notification"]["title"], "Hi");
        assert_eq!(payload["notification"]["sound"], "default");
        assert_eq!(payload["notification"]["badge"], "1");
        assert_eq!(payload["data"]["order_id"], "42");
        assert_eq!(payload["data"]["click_action"], CLICK_ACTION);
        assert_eq!(payload["priority"], "high");
        assert_eq!(payload["content_available"], true);
    }

    #[test]
    fn test_modern_payload_shape() {
        let payload = ModernWire::new("https://fcm.googleapis.com", Some("p".into()))
            .build_payload("tok-1", &request());
        let message = &payload["message"];

        assert_eq!(message["token"], "tok-1");
        assert_eq!(message["notification"], json!({ "title": "Hi", "body": "there" }));
        assert_eq!(message["data"]["click_action"], CLICK_ACTION);
        assert_eq!(message["android"]["priority"], "high");
        assert_eq!(message["android"]["notification"]["channel_id"], ANDROID_CHANNEL_ID);
        assert_eq!(message["apns"]["payload"]["aps"]["badge"], 1);
        assert_eq!(message["apns"]["payload"]["aps"]["content-available"], 1);
    }

    #[test]
    fn test_modern_endpoint() {
        let wire = ModernWire::new("https://fcm.googleapis.com/", Some("demo".into()));
        assert_eq!(
            wire.endpoint().unwrap(),
            "https://fcm.googleapis.com/v1/projects/demo/messages:send"
        );

        let missing = ModernWire::new("https://fcm.googleapis.com", None);
        assert!(matches!(missing.endpoint(), Err(AppError::Configuration(_))));
    }

    #[test]
    fn test_legacy_success_needs_body_flag() {
        let wire = LegacyWire::new("unused");
        assert_eq!(
            wire.classify(StatusCode::OK, &json!({ "success": 1, "failure": 0 })),
            Verdict::Delivered
        );
        // HTTP 200 with a per-message failure is not a success
        assert_eq!(
            wire.classify(
                StatusCode::OK,
                &json!({ "success": 0, "failure": 1, "results": [{ "error": "Unavailable" }] })
            ),
            Verdict::Transient("Unavailable".to_string())
        );
    }

    #[test]
    fn test_legacy_permanent_codes() {
        let wire = LegacyWire::new("unused");
        for code in LEGACY_PERMANENT_CODES {
            let body = json!({ "success": 0, "failure": 1, "results": [{ "error": code }] });
            assert_eq!(
                wire.classify(StatusCode::OK, &body),
                Verdict::Permanent(code.to_string())
            );
        }
        assert_eq!(
            wire.classify(StatusCode::INTERNAL_SERVER_ERROR, &Value::Null),
            Verdict::Transient("HTTP 500".to_string())
        );
    }

    #[test]
    fn test_modern_classification() {
        let wire = ModernWire::new("unused", Some("p".into()));
        assert_eq!(
            wire.classify(StatusCode::OK, &json!({ "name": "projects/p/messages/1" })),
            Verdict::Delivered
        );

        let unregistered = json!({
            "error": {
                "code": 404,
                "status": "NOT_FOUND",
                "details": [
                    { "@type": "type.googleapis.com/google.firebase.fcm.v1.FcmError", "errorCode": "UNREGISTERED" }
                ]
            }
        });
        assert_eq!(
            wire.classify(StatusCode::NOT_FOUND, &unregistered),
            Verdict::Permanent("UNREGISTERED".to_string())
        );

        let invalid = json!({ "error": { "code": 400, "status": "INVALID_ARGUMENT" } });
        assert_eq!(
            wire.classify(StatusCode::BAD_REQUEST, &invalid),
            Verdict::Permanent("INVALID_ARGUMENT".to_string())
        );

        let quota = json!({
            "error": { "status": "RESOURCE_EXHAUSTED", "details": [{ "errorCode": "QUOTA_EXCEEDED" }] }
        });
        assert_eq!(
            wire.classify(StatusCode::TOO_MANY_REQUESTS, &quota),
            Verdict::Transient("QUOTA_EXCEEDED".to_string())
        );

        assert_eq!(
            wire.classify(StatusCode::SERVICE_UNAVAILABLE, &Value::Null),
            Verdict::Transient("HTTP 503".to_string())
        );
    }

    #[test]
    fn test_modern_reads_only_first_detail() {
        let wire = ModernWire::new("unused", Some("p".into()));

        // A later detail's code is ignored; the status is the fallback
        let body = json!({
            "error": {
                "status": "INVALID_ARGUMENT",
                "details": [
                    { "@type": "type.googleapis.com/google.rpc.BadRequest" },
                    { "errorCode": "QUOTA_EXCEEDED" }
                ]
            }
        });
        assert_eq!(
            wire.classify(StatusCode::BAD_REQUEST, &body),
            Verdict::Permanent("INVALID_ARGUMENT".to_string())
        );
    }
}
