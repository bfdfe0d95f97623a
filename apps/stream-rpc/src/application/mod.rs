//! Application Layer - Use cases and port definitions.
//!
//! The use cases here know nothing about the RPC transport: they take domain
//! values and item sequences, and return domain values, item sequences or a
//! classified [`CallError`](crate::domain::status::CallError).

/// Port interfaces for external systems (document store).
pub mod ports;

/// Calculator, greeter and blog use cases.
pub mod services;

/// Inbound and outbound item sequences.
pub mod session;
