//! Push delivery engine.
//!
//! Flow of one request: fetch the user's active registrations, acquire a
//! credential, send to every registration concurrently, deactivate the ones
//! the provider reports as permanently invalid, and summarize.
//!
//! The deployment picks one `DeliveryStrategy` (legacy server key or v1
//! service account); the dispatcher, lifecycle handling and aggregation are
//! shared by both.

mod dispatcher;
mod lifecycle;
mod service;
mod strategy;
mod summary;
mod types;
mod wire;

pub use dispatcher::PushDispatcher;
pub use lifecycle::TokenLifecycleManager;
pub use service::PushService;
pub use strategy::DeliveryStrategy;
pub use summary::{DeliverySummary, PushResponse, NO_DEVICES_MESSAGE};
pub use types::{
    DeviceRegistration, DispatchOutcome, DispatchResult, Failure, FailureKind,
    NotificationRequest, Platform, UnknownPlatform,
};
pub use wire::{
    LegacyWire, ModernWire, Verdict, WireFormat, CLICK_ACTION, LEGACY_PERMANENT_CODES,
    MODERN_PERMANENT_CODES,
};
