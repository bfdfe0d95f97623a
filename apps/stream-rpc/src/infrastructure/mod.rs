//! Infrastructure Layer - Adapters for the transport, storage and
//! operational surfaces.

/// Environment configuration.
pub mod config;

/// gRPC adapters, server, client and call tracking.
pub mod grpc;

/// Health and metrics HTTP endpoint.
pub mod health;

/// Prometheus metrics.
pub mod metrics;

/// Blog store implementations.
pub mod persistence;

/// Tracing and OpenTelemetry setup.
pub mod telemetry;
