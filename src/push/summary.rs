use serde::Serialize;

use super::types::DispatchResult;

pub const NO_DEVICES_MESSAGE: &str = "No devices to send to";

/// Joined outcomes of one invocation.
#[derive(Debug, Clone, Serialize)]
pub struct DeliverySummary {
    pub success: bool,
    pub sent: usize,
    pub total: usize,
    pub results: Vec<DispatchResult>,
}

impl DeliverySummary {
    /// `total` is the number of settled entries, one per dispatched registration.
    pub fn from_results(results: Vec<DispatchResult>) -> Self {
        let sent = results.iter().filter(|r| r.is_success()).count();
        Self {
            success: true,
            sent,
            total: results.len(),
            results,
        }
    }
}

/// Response body of a send request.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PushResponse {
    /// The user had no active registrations; nothing was sent
    NoDevices {
        success: bool,
        message: &'static str,
        sent: usize,
    },
    Summary(DeliverySummary),
}

impl PushResponse {
    pub fn no_devices() -> Self {
        PushResponse::NoDevices {
            success: true,
            message: NO_DEVICES_MESSAGE,
            sent: 0,
        }
    }

    pub fn sent(&self) -> usize {
        match self {
            PushResponse::NoDevices { sent, .. } => *sent,
            PushResponse::Summary(summary) => summary.sent,
        }
    }

    pub fn total(&self) -> usize {
        match self {
            PushResponse::NoDevices { .. } => 0,
            PushResponse::Summary(summary) => summary.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::push::{DispatchOutcome, Platform};
    use serde_json::json;

    fn outcome(token: &str, success: bool) -> DispatchResult {
        DispatchResult::Settled(DispatchOutcome {
            token: token.to_string(),
            platform: Platform::Ios,
            success,
            result: json!({}),
            failure: None,
            deactivated: false,
        })
    }

    #[test]
    fn test_counts() {
        let summary = DeliverySummary::from_results(vec![
            outcome("a", true),
            outcome("b", false),
            DispatchResult::Failed {
                error: "task panicked".to_string(),
            },
            outcome("c", true),
        ]);
        assert!(summary.success);
        assert_eq!(summary.sent, 2);
        assert_eq!(summary.total, 4);
    }

    #[test]
    fn test_empty_summary() {
        let summary = DeliverySummary::from_results(vec![]);
        assert_eq!(summary.sent, 0);
        assert_eq!(summary.total, 0);
    }

    #[test]
    fn test_no_devices_body() {
        let json = serde_json::to_value(PushResponse::no_devices()).unwrap();
        assert_eq!(
            json,
            json!({ "success": true, "message": "No devices to send to", "sent": 0 })
        );
    }

    #[test]
    fn test_summary_body() {
        let response = PushResponse::Summary(DeliverySummary::from_results(vec![outcome("a", true)]));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["sent"], 1);
        assert_eq!(json["total"], 1);
        assert_eq!(json["results"][0]["token"], "a");
        assert_eq!(response.sent(), 1);
        assert_eq!(response.total(), 1);
    }
}
