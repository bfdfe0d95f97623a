//! Logical Call Model
//!
//! A call has a fixed [`CallShape`] chosen when it is opened, an optional
//! absolute [`Deadline`], and ends with exactly one terminal status.

use std::time::{Duration, Instant};

/// How many items travel in one direction of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Exactly one item.
    One,
    /// A finite sequence of zero or more items.
    Many,
}

/// The four interaction shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallShape {
    /// One request, one response.
    Unary,
    /// One request, a sequence of responses.
    ServerStreaming,
    /// A sequence of requests, one response.
    ClientStreaming,
    /// Independent request and response sequences.
    Bidirectional,
}

impl CallShape {
    /// All shapes, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::Unary,
        Self::ServerStreaming,
        Self::ClientStreaming,
        Self::Bidirectional,
    ];

    /// Cardinality of the caller-to-callee direction.
    #[must_use]
    pub const fn requests(self) -> Cardinality {
        match self {
            Self::Unary | Self::ServerStreaming => Cardinality::One,
            Self::ClientStreaming | Self::Bidirectional => Cardinality::Many,
        }
    }

    /// Cardinality of the callee-to-caller direction.
    #[must_use]
    pub const fn responses(self) -> Cardinality {
        match self {
            Self::Unary | Self::ClientStreaming => Cardinality::One,
            Self::ServerStreaming | Self::Bidirectional => Cardinality::Many,
        }
    }

    /// Stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unary => "unary",
            Self::ServerStreaming => "server_streaming",
            Self::ClientStreaming => "client_streaming",
            Self::Bidirectional => "bidirectional",
        }
    }

    /// Position in [`Self::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Absolute point in time by which a call must finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deadline(Instant);

impl Deadline {
    /// Deadline `timeout` from now.
    #[must_use]
    pub fn from_timeout(timeout: Duration) -> Self {
        Self(Instant::now() + timeout)
    }

    /// Deadline at a fixed instant.
    #[must_use]
    pub const fn at(instant: Instant) -> Self {
        Self(instant)
    }

    /// The underlying instant.
    #[must_use]
    pub const fn instant(self) -> Instant {
        self.0
    }

    /// Time left; zero once expired.
    #[must_use]
    pub fn remaining(self) -> Duration {
        self.0.saturating_duration_since(Instant::now())
    }

    /// Whether the deadline has already passed.
    #[must_use]
    pub fn is_expired(self) -> bool {
        Instant::now() >= self.0
    }
}
