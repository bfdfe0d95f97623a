//! Domain Layer - Call model, status taxonomy and the pure algorithms
//! carried by the services.
//!
//! Nothing here depends on the RPC transport.

/// Streaming aggregators (average, maximum, prime factorization).
pub mod aggregators;

/// Blog resource and identifiers.
pub mod blog;

/// Sum and square root.
pub mod calculator;

/// Call shapes and deadlines.
pub mod call;

/// Greeting payloads.
pub mod greeting;

/// Status codes and classified call errors.
pub mod status;
