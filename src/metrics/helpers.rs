//! Metrics helper structs for convenient metric recording

use prometheus::{Encoder, TextEncoder};

use crate::credentials::CredentialScheme;

use super::{CREDENTIALS_TOTAL, DEACTIVATIONS_TOTAL, DISPATCH_DURATION, REQUESTS_TOTAL, SENDS_TOTAL};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording request-level metrics
pub struct RequestMetrics;

impl RequestMetrics {
    pub fn record_sent() {
        REQUESTS_TOTAL.with_label_values(&["sent"]).inc();
    }

    pub fn record_no_devices() {
        REQUESTS_TOTAL.with_label_values(&["no_devices"]).inc();
    }

    pub fn record_error() {
        REQUESTS_TOTAL.with_label_values(&["error"]).inc();
    }
}

/// Helper struct for recording per-device send metrics
pub struct DispatchMetrics;

impl DispatchMetrics {
    pub fn record_delivered() {
        SENDS_TOTAL.with_label_values(&["delivered"]).inc();
    }

    pub fn record_permanent_failure() {
        SENDS_TOTAL.with_label_values(&["permanent"]).inc();
    }

    pub fn record_transient_failure() {
        SENDS_TOTAL.with_label_values(&["transient"]).inc();
    }

    /// A send task that died before producing an outcome
    pub fn record_aborted() {
        SENDS_TOTAL.with_label_values(&["aborted"]).inc();
    }

    pub fn observe_duration(seconds: f64) {
        DISPATCH_DURATION.observe(seconds);
    }
}

/// Helper struct for recording registration lifecycle metrics
pub struct LifecycleMetrics;

impl LifecycleMetrics {
    pub fn record_deactivated() {
        DEACTIVATIONS_TOTAL.with_label_values(&["ok"]).inc();
    }

    pub fn record_deactivation_failed() {
        DEACTIVATIONS_TOTAL.with_label_values(&["failed"]).inc();
    }
}

/// Helper struct for recording credential metrics
pub struct CredentialMetrics;

impl CredentialMetrics {
    pub fn record_acquired(scheme: CredentialScheme) {
        CREDENTIALS_TOTAL
            .with_label_values(&[scheme.as_str(), "ok"])
            .inc();
    }

    pub fn record_failed(scheme: CredentialScheme) {
        CREDENTIALS_TOTAL
            .with_label_values(&[scheme.as_str(), "error"])
            .inc();
    }
}
