//! Health Check and Metrics Endpoint
//!
//! HTTP side channel next to the gRPC server, for orchestrators and
//! monitoring.
//!
//! # Endpoints
//!
//! - `GET /health` - JSON status with per-shape call counters
//! - `GET /healthz` - liveness probe
//! - `GET /readyz` - readiness probe, fails once shutdown has begun
//! - `GET /metrics` - Prometheus metrics in text format

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::infrastructure::grpc::{CallTracker, ShapeStats};
use crate::infrastructure::metrics::get_metrics_handle;

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// "serving" or "draining".
    pub status: HealthStatus,
    /// Server version.
    pub version: String,
    /// Uptime in seconds.
    pub uptime_secs: u64,
    /// Current time.
    pub current_time: DateTime<Utc>,
    /// Calls currently in flight across all shapes.
    pub in_flight: u64,
    /// Counters per call shape.
    pub calls: Vec<ShapeStats>,
}

/// Overall status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Accepting calls.
    Serving,
    /// Shutdown started; in-flight calls are draining.
    Draining,
}

/// Shared state for the health server.
#[derive(Debug)]
pub struct HealthServerState {
    version: String,
    started_at: Instant,
    tracker: Arc<CallTracker>,
    shutdown: CancellationToken,
}

impl HealthServerState {
    /// Create new health server state. `shutdown` is the token that stops
    /// the gRPC server.
    #[must_use]
    pub fn new(version: String, tracker: Arc<CallTracker>, shutdown: CancellationToken) -> Self {
        Self {
            version,
            started_at: Instant::now(),
            tracker,
            shutdown,
        }
    }

    fn status(&self) -> HealthStatus {
        if self.shutdown.is_cancelled() {
            HealthStatus::Draining
        } else {
            HealthStatus::Serving
        }
    }
}

/// Health check HTTP server.
pub struct HealthServer {
    addr: SocketAddr,
    state: Arc<HealthServerState>,
    cancel: CancellationToken,
}

impl HealthServer {
    /// Create a new health server. It stops when `cancel` fires.
    #[must_use]
    pub const fn new(
        addr: SocketAddr,
        state: Arc<HealthServerState>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            addr,
            state,
            cancel,
        }
    }

    /// Run the health server until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `HealthServerError` if binding fails or the HTTP server
    /// encounters a fatal error while running.
    pub async fn run(self) -> Result<(), HealthServerError> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|e| HealthServerError::BindFailed(self.addr, e.to_string()))?;

        tracing::info!(addr = %self.addr, "Health server listening");

        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(self.cancel.cancelled_owned())
            .await
            .map_err(|e| HealthServerError::ServerFailed(e.to_string()))?;

        tracing::info!("Health server stopped");
        Ok(())
    }
}

fn router(state: Arc<HealthServerState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/healthz", get(liveness_handler))
        .route("/readyz", get(readiness_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

async fn health_handler(State(state): State<Arc<HealthServerState>>) -> impl IntoResponse {
    Json(build_health_response(&state))
}

async fn liveness_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn readiness_handler(State(state): State<Arc<HealthServerState>>) -> impl IntoResponse {
    match state.status() {
        HealthStatus::Serving => (StatusCode::OK, "READY"),
        HealthStatus::Draining => (StatusCode::SERVICE_UNAVAILABLE, "NOT READY"),
    }
}

async fn metrics_handler() -> impl IntoResponse {
    get_metrics_handle().map_or_else(
        || {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [("content-type", "text/plain")],
                "Metrics not initialized".to_string(),
            )
        },
        |handle| {
            (
                StatusCode::OK,
                [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
                handle.render(),
            )
        },
    )
}

fn build_health_response(state: &HealthServerState) -> HealthResponse {
    HealthResponse {
        status: state.status(),
        version: state.version.clone(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        current_time: Utc::now(),
        in_flight: state.tracker.total_in_flight(),
        calls: state.tracker.snapshot(),
    }
}

/// Health server errors.
#[derive(Debug, thiserror::Error)]
pub enum HealthServerError {
    /// Failed to bind the listen address.
    #[error("failed to bind to {0}: {1}")]
    BindFailed(SocketAddr, String),

    /// Server error.
    #[error("server error: {0}")]
    ServerFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::call::CallShape;
    use crate::domain::status::StatusCode as CallStatus;

    fn state() -> HealthServerState {
        HealthServerState::new(
            "0.1.0".to_string(),
            Arc::new(CallTracker::new()),
            CancellationToken::new(),
        )
    }

    #[test]
    fn health_status_serialization() {
        assert_eq!(
            serde_json::to_string(&HealthStatus::Serving).unwrap(),
            "\"serving\""
        );
        assert_eq!(
            serde_json::to_string(&HealthStatus::Draining).unwrap(),
            "\"draining\""
        );
    }

    #[test]
    fn response_reports_call_counters() {
        let state = state();
        let open = state.tracker.begin("GreetService/Greet", CallShape::Unary);
        state
            .tracker
            .begin("CalculatorService/Sum", CallShape::Unary)
            .finish(CallStatus::Ok);

        let response = build_health_response(&state);
        assert_eq!(response.status, HealthStatus::Serving);
        assert_eq!(response.in_flight, 1);
        let unary = response
            .calls
            .iter()
            .find(|s| s.shape == CallShape::Unary.as_str())
            .unwrap();
        assert_eq!(unary.in_flight, 1);
        assert_eq!(unary.completed, 1);

        drop(open);
        assert_eq!(build_health_response(&state).in_flight, 0);
    }

    #[test]
    fn draining_after_shutdown() {
        let state = state();
        state.shutdown.cancel();
        assert_eq!(state.status(), HealthStatus::Draining);
        assert_eq!(build_health_response(&state).status, HealthStatus::Draining);
    }

    #[tokio::test]
    async fn serves_readiness_until_cancelled() {
        let state = Arc::new(state());
        let shutdown = state.shutdown.clone();

        let ready = readiness_handler(State(Arc::clone(&state))).await.into_response();
        assert_eq!(ready.status(), StatusCode::OK);

        shutdown.cancel();
        let ready = readiness_handler(State(state)).await.into_response();
        assert_eq!(ready.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
