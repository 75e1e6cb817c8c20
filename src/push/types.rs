use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Inbound request: notify every active device of one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub user_id: String,
    pub title: String,
    pub body: String,
    /// Extra key/value pairs forwarded in the provider's `data` section
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl NotificationRequest {
    pub fn new(user_id: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            title: title.into(),
            body: body.into(),
            data: Map::new(),
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
    Web,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Ios => "ios",
            Platform::Android => "android",
            Platform::Web => "web",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPlatform(pub String);

impl fmt::Display for UnknownPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown platform '{}'", self.0)
    }
}

impl std::error::Error for UnknownPlatform {}

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ios" => Ok(Platform::Ios),
            "android" => Ok(Platform::Android),
            "web" => Ok(Platform::Web),
            _ => Err(UnknownPlatform(s.to_string())),
        }
    }
}

/// A provider-issued device token as held by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRegistration {
    pub token: String,
    pub platform: Platform,
    pub is_active: bool,
}

impl DeviceRegistration {
    pub fn active(token: impl Into<String>, platform: Platform) -> Self {
        Self {
            token: token.into(),
            platform,
            is_active: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// The registration itself is dead; it gets deactivated
    Permanent,
    /// Network, rate limiting, server error; the registration is left alone
    Transient,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub reason: String,
}

/// Outcome of one send attempt to one registration.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchOutcome {
    pub token: String,
    pub platform: Platform,
    pub success: bool,
    /// Provider response body, or an `{ "error": ... }` object when there was none
    pub result: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
    pub deactivated: bool,
}

impl DispatchOutcome {
    pub fn is_permanent_failure(&self) -> bool {
        matches!(
            self.failure,
            Some(Failure {
                kind: FailureKind::Permanent,
                ..
            })
        )
    }
}

/// One entry of the summary: either an outcome or the reason its task died.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DispatchResult {
    Settled(DispatchOutcome),
    Failed { error: String },
}

impl DispatchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, DispatchResult::Settled(outcome) if outcome.success)
    }

    pub fn outcome(&self) -> Option<&DispatchOutcome> {
        match self {
            DispatchResult::Settled(outcome) => Some(outcome),
            DispatchResult::Failed { .. } => None,
        }
    }
}

/// Shortened token for log lines.
pub(crate) fn token_prefix(token: &str) -> &str {
    let end = token
        .char_indices()
        .nth(12)
        .map(|(idx, _)| idx)
        .unwrap_or(token.len());
    &token[..end]
}
