//! Prometheus metrics registry and instruments.
//!
//! This module is view-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Reconciliation Metrics
    pub static ref MERGES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("starling_merges_total", "Number of status copies replaced by merge"),
        &["view"]
    ).expect("metric can be created");
    pub static ref REMOVALS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("starling_removals_total", "Number of status copies removed after deletion"),
        &["view"]
    ).expect("metric can be created");
    pub static ref STALE_COMPLETIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("starling_stale_completions_total", "Async completions discarded after their context was invalidated"),
        &["context"]
    ).expect("metric can be created");

    // Notification Metrics
    pub static ref NOTIFICATIONS_CLASSIFIED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("starling_notifications_classified_total", "Notifications by render category"),
        &["category"]
    ).expect("metric can be created");

    // Composer Metrics
    pub static ref SUBMISSIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("starling_submissions_total", "Status submissions by outcome"),
        &["outcome"]
    ).expect("metric can be created");
    pub static ref ACCOUNT_SWITCHES_TOTAL: IntCounter = IntCounter::new(
        "starling_account_switches_total",
        "Number of active account selections"
    ).expect("metric can be created");

    // Streaming Metrics
    pub static ref STREAM_EVENTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("starling_stream_events_total", "Streaming events received"),
        &["event"]
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("starling_errors_total", "Total number of errors"),
        &["error_type", "operation"]
    ).expect("metric can be created");
}

/// Initialize metrics registry.
pub fn init_metrics() {
    REGISTRY
        .register(Box::new(MERGES_TOTAL.clone()))
        .expect("MERGES_TOTAL can be registered");
    REGISTRY
        .register(Box::new(REMOVALS_TOTAL.clone()))
        .expect("REMOVALS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(STALE_COMPLETIONS_TOTAL.clone()))
        .expect("STALE_COMPLETIONS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(NOTIFICATIONS_CLASSIFIED_TOTAL.clone()))
        .expect("NOTIFICATIONS_CLASSIFIED_TOTAL can be registered");
    REGISTRY
        .register(Box::new(SUBMISSIONS_TOTAL.clone()))
        .expect("SUBMISSIONS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(ACCOUNT_SWITCHES_TOTAL.clone()))
        .expect("ACCOUNT_SWITCHES_TOTAL can be registered");
    REGISTRY
        .register(Box::new(STREAM_EVENTS_TOTAL.clone()))
        .expect("STREAM_EVENTS_TOTAL can be registered");
    REGISTRY
        .register(Box::new(ERRORS_TOTAL.clone()))
        .expect("ERRORS_TOTAL can be registered");

    tracing::info!("Metrics registry initialized");
}

/// Render the registry in the Prometheus text exposition format
pub fn gather() -> String {
    let mut buffer = Vec::new();
    if let Err(error) = TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer) {
        tracing::warn!(%error, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
