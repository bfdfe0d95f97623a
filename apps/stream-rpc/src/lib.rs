#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! Stream RPC - Streaming gRPC Interaction Core
//!
//! Three gRPC services exercising every call shape:
//!
//! - **Greet**: unary, server-streaming, client-streaming, bidirectional and
//!   a deadline-aware unary call
//! - **Calculator**: sum, square root, prime factorization, running average
//!   and running maximum
//! - **Blog**: create, read, update, delete and list over a document store
//!
//! # Layers (inside to outside)
//!
//! - **Domain**: call model, status taxonomy and the pure algorithms
//!   - `aggregators`: running average, running maximum, prime factors
//!   - `call`: call shapes and deadlines
//!   - `status`: status codes and classified call errors
//!
//! - **Application**: use cases and ports
//!   - `ports`: the blog document store
//!   - `services`: calculator, greeter and blog use cases
//!   - `session`: inbound and outbound item sequences
//!
//! - **Infrastructure**: adapters
//!   - `grpc`: tonic adapters, server, callers, deadlines and TLS
//!   - `persistence`: in-memory blog store
//!   - `config`, `health`, `metrics`, `telemetry`
//!
//! # Call Flow
//!
//! ```text
//! caller ──► tonic ──► adapter ──► use case ──► aggregator / store
//!               ▲         │
//!               │     CallGuard (shape, method, terminal status)
//!               └─────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

/// Domain layer - Call model and algorithms with no transport dependencies.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and operational surfaces.
pub mod infrastructure;

// Domain types
pub use domain::blog::{Blog, BlogDraft, BlogId};
pub use domain::call::{CallShape, Cardinality, Deadline};
pub use domain::greeting::Person;
pub use domain::status::{CallError, StatusCode};

// Ports and use cases
pub use application::ports::{BlogStore, StoreError};
pub use application::services::{CalculatorSettings, GreeterSettings};

// Configuration
pub use infrastructure::config::{
    ClientSettings, ConfigError, RpcConfig, ServerSettings, StreamSettings, TlsSettings,
};

// gRPC
pub use infrastructure::grpc::{
    CallTracker, ClientError, ClientTls, DuplexSession, ResponseSequence, RpcClient, RpcServer,
    RpcServerError, ServerTls, ShapeStats, TlsError, proto,
};

// Storage
pub use infrastructure::persistence::InMemoryBlogStore;

// Health server
pub use infrastructure::health::{HealthServer, HealthServerError, HealthServerState};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
