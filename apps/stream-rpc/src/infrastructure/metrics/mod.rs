//! Prometheus Metrics Module
//!
//! Exposes call-level metrics in Prometheus format.
//!
//! # Metrics Categories
//!
//! - **Calls**: started and finished calls by method, shape and status
//! - **Items**: stream items by method and direction
//! - **In flight**: open calls per shape
//! - **Latency**: call duration from open to terminal status
//!
//! # Integration
//!
//! Metrics are exposed at `/metrics` on the health server port.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::domain::call::CallShape;
use crate::domain::status::StatusCode;

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// # Panics
///
/// Panics if the recorder cannot be installed.
#[allow(clippy::expect_used)]
pub fn init_metrics() -> PrometheusHandle {
    PROMETHEUS_HANDLE
        .get_or_init(|| {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder");

            register_metrics();
            handle
        })
        .clone()
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "stream_rpc_calls_started_total",
        "Total calls opened, by method and shape"
    );
    describe_counter!(
        "stream_rpc_calls_finished_total",
        "Total calls that reached a terminal status"
    );
    describe_counter!(
        "stream_rpc_stream_items_total",
        "Total stream items by method and direction"
    );
    describe_gauge!("stream_rpc_calls_in_flight", "Calls currently open, by shape");
    describe_histogram!(
        "stream_rpc_call_duration_seconds",
        "Time from call open to terminal status"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Direction of a stream item relative to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Caller to callee.
    Inbound,
    /// Callee to caller.
    Outbound,
}

impl Direction {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
        }
    }
}

/// Record a call being opened.
pub fn record_call_started(method: &'static str, shape: CallShape) {
    counter!(
        "stream_rpc_calls_started_total",
        "method" => method,
        "shape" => shape.as_str()
    )
    .increment(1);
}

/// Record a call reaching its terminal status.
pub fn record_call_finished(
    method: &'static str,
    shape: CallShape,
    status: StatusCode,
    duration: Duration,
) {
    counter!(
        "stream_rpc_calls_finished_total",
        "method" => method,
        "shape" => shape.as_str(),
        "status" => status.as_str()
    )
    .increment(1);
    histogram!(
        "stream_rpc_call_duration_seconds",
        "method" => method,
        "shape" => shape.as_str()
    )
    .record(duration.as_secs_f64());
}

/// Record one stream item.
pub fn record_stream_item(method: &'static str, direction: Direction) {
    counter!(
        "stream_rpc_stream_items_total",
        "method" => method,
        "direction" => direction.as_str()
    )
    .increment(1);
}

/// Count one more open call of `shape`.
pub fn increment_in_flight(shape: CallShape) {
    gauge!("stream_rpc_calls_in_flight", "shape" => shape.as_str()).increment(1.0);
}

/// Count one fewer open call of `shape`.
pub fn decrement_in_flight(shape: CallShape) {
    gauge!("stream_rpc_calls_in_flight", "shape" => shape.as_str()).decrement(1.0);
}

// =============================================================================
// Tests
// =============================================================================
