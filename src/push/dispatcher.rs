use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{FuturesUnordered, StreamExt};
use reqwest::header::AUTHORIZATION;
use serde_json::{json, Value};
use tokio::task::JoinError;

use crate::config::ProviderConfig;
use crate::credentials::Credential;
use crate::metrics::DispatchMetrics;

use super::lifecycle::TokenLifecycleManager;
use super::types::{
    token_prefix, DeviceRegistration, DispatchOutcome, DispatchResult, Failure, FailureKind,
    NotificationRequest,
};
use super::wire::{Verdict, WireFormat};

/// Everything a single send needs, shared by all tasks of one invocation.
struct SendContext {
    endpoint: String,
    authorization: String,
    request: NotificationRequest,
}

/// Fans one notification out to many registrations.
///
/// Each registration gets its own spawned task and exactly one send attempt.
/// A failing or panicking task never affects its siblings, and `dispatch`
/// only returns once every task has settled.
#[derive(Clone)]
pub struct PushDispatcher {
    client: reqwest::Client,
    wire: Arc<dyn WireFormat>,
    lifecycle: Arc<TokenLifecycleManager>,
    max_concurrent_sends: Option<usize>,
    request_timeout: Option<Duration>,
}

impl PushDispatcher {
    pub fn new(
        client: reqwest::Client,
        wire: Arc<dyn WireFormat>,
        lifecycle: Arc<TokenLifecycleManager>,
    ) -> Self {
        Self {
            client,
            wire,
            lifecycle,
            max_concurrent_sends: None,
            request_timeout: None,
        }
    }

    /// Apply the optional send limits from provider settings.
    pub fn with_limits(mut self, config: &ProviderConfig) -> Self {
        self.max_concurrent_sends = config.max_concurrent_sends.filter(|n| *n > 0);
        self.request_timeout = config.request_timeout_seconds.map(Duration::from_secs);
        self
    }

    /// Send to every registration and return one result per registration,
    /// in settlement order.
    #[tracing::instrument(
        name = "dispatcher.dispatch",
        skip_all,
        fields(wire = self.wire.name(), registrations = registrations.len())
    )]
    pub async fn dispatch(
        &self,
        credential: &Credential,
        endpoint: &str,
        request: &NotificationRequest,
        registrations: Vec<DeviceRegistration>,
    ) -> Vec<DispatchResult> {
        if registrations.is_empty() {
            return Vec::new();
        }

        let started = Instant::now();
        let context = Arc::new(SendContext {
            endpoint: endpoint.to_string(),
            authorization: credential.authorization(),
            request: request.clone(),
        });
        let limit = self.max_concurrent_sends.unwrap_or(usize::MAX);

        let mut in_flight = FuturesUnordered::new();
        let mut results = Vec::with_capacity(registrations.len());

        for registration in registrations {
            let dispatcher = self.clone();
            let context = context.clone();
            in_flight.push(tokio::spawn(async move {
                dispatcher.send_one(&context, registration).await
            }));

            // Drain completions while at the concurrency limit
            while in_flight.len() >= limit {
                match in_flight.next().await {
                    Some(joined) => results.push(Self::settle(joined)),
                    None => break,
                }
            }
        }

        while let Some(joined) = in_flight.next().await {
            results.push(Self::settle(joined));
        }

        DispatchMetrics::observe_duration(started.elapsed().as_secs_f64());
        results
    }

    fn settle(joined: Result<DispatchOutcome, JoinError>) -> DispatchResult {
        match joined {
            Ok(outcome) => DispatchResult::Settled(outcome),
            Err(e) => {
                DispatchMetrics::record_aborted();
                tracing::error!(error = %e, "Send task aborted");
                DispatchResult::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    async fn send_one(&self, context: &SendContext, registration: DeviceRegistration) -> DispatchOutcome {
        let (verdict, result) = self.post(context, &registration.token).await;

        let (success, failure, deactivated) = match verdict {
            Verdict::Delivered => {
                DispatchMetrics::record_delivered();
                tracing::debug!(token = %token_prefix(&registration.token), "Push delivered");
                (true, None, false)
            }
            Verdict::Permanent(code) => {
                DispatchMetrics::record_permanent_failure();
                let deactivated = self.lifecycle.deactivate(&registration.token).await;
                let failure = Failure {
                    kind: FailureKind::Permanent,
                    reason: code,
                };
                (false, Some(failure), deactivated)
            }
            Verdict::Transient(reason) => {
                DispatchMetrics::record_transient_failure();
                tracing::debug!(
                    token = %token_prefix(&registration.token),
                    reason = %reason,
                    "Push failed, registration kept"
                );
                let failure = Failure {
                    kind: FailureKind::Transient,
                    reason,
                };
                (false, Some(failure), false)
            }
        };

        DispatchOutcome {
            token: registration.token,
            platform: registration.platform,
            success,
            result,
            failure,
            deactivated,
        }
    }

    /// Issue the HTTP request and classify whatever comes back.
    /// Network errors and unreadable bodies are transient.
    async fn post(&self, context: &SendContext, token: &str) -> (Verdict, Value) {
        let payload = self.wire.build_payload(token, &context.request);

        let mut request = self
            .client
            .post(&context.endpoint)
            .header(AUTHORIZATION, &context.authorization)
            .json(&payload);
        if let Some(timeout) = self.request_timeout {
            request = request.timeout(timeout);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                let reason = if e.is_timeout() {
                    "request timed out".to_string()
                } else {
                    format!("request failed: {}", e)
                };
                return (Verdict::Transient(reason), json!({ "error": e.to_string() }));
            }
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                return (
                    Verdict::Transient(format!("unreadable response: {}", e)),
                    json!({ "error": e.to_string(), "status": status.as_u16() }),
                );
            }
        };

        match serde_json::from_str::<Value>(&text) {
            Ok(body) => (self.wire.classify(status, &body), body),
            Err(e) => (
                Verdict::Transient(format!("malformed provider response (HTTP {})", status.as_u16())),
                json!({ "error": e.to_string(), "status": status.as_u16(), "body": text }),
            ),
        }
    }
}
