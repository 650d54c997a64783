//! Prometheus metrics for the locker server.
//!
//! Counts registry operations, failures by stage, and orphans observed
//! between the metadata index and the object store.
//!
//! The `/metrics` endpoint is unauthenticated. Restrict it at the network
//! level if the server is reachable from untrusted clients.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{self, Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::{LazyLock, Once};

/// Global Prometheus registry for all metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

pub static UPLOADS: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new("locker_uploads_total", "Total number of successful uploads")
        .expect("metric creation failed")
});

pub static DOWNLOADS: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "locker_downloads_total",
        "Total number of successful downloads",
    )
    .expect("metric creation failed")
});

pub static DELETES: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "locker_deletes_total",
        "Total number of deletes that removed an index row",
    )
    .expect("metric creation failed")
});

pub static BYTES_UPLOADED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "locker_bytes_uploaded_total",
        "Total bytes written to the object store by uploads",
    )
    .expect("metric creation failed")
});

pub static OPERATION_ERRORS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "locker_operation_errors_total",
            "Registry operation failures by operation and error type",
        ),
        &["operation", "error_type"],
    )
    .expect("metric creation failed")
});

pub static ORPHANS_DETECTED: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "locker_orphans_detected_total",
            "Orphans created or observed, by kind (object or metadata)",
        ),
        &["kind"],
    )
    .expect("metric creation failed")
});

static REGISTER_ONCE: Once = Once::new();

/// Register all metrics with the global registry. Safe to call repeatedly.
pub fn register_metrics() {
    REGISTER_ONCE.call_once(|| {
        REGISTRY
            .register(Box::new(UPLOADS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(DOWNLOADS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(DELETES.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(BYTES_UPLOADED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(OPERATION_ERRORS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(ORPHANS_DETECTED.clone()))
            .expect("metric registration failed");
    });
}

/// Handler for GET /metrics.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {e}").into_bytes(),
        ),
    }
}

/// Record a failed registry operation.
pub fn record_operation_error(operation: &str, error_type: &str) {
    OPERATION_ERRORS
        .with_label_values(&[operation, error_type])
        .inc();
}

/// Record an orphan of the given kind (`object` or `metadata`).
pub fn record_orphan(kind: &str) {
    ORPHANS_DETECTED.with_label_values(&[kind]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        register_metrics();
        register_metrics();
    }

    #[test]
    fn test_labelled_counters_increment() {
        let before = OPERATION_ERRORS
            .with_label_values(&["upload", "index_write"])
            .get();
        record_operation_error("upload", "index_write");
        assert_eq!(
            OPERATION_ERRORS
                .with_label_values(&["upload", "index_write"])
                .get(),
            before + 1
        );

        let before = ORPHANS_DETECTED.with_label_values(&["object"]).get();
        record_orphan("object");
        assert_eq!(
            ORPHANS_DETECTED.with_label_values(&["object"]).get(),
            before + 1
        );
    }
}
