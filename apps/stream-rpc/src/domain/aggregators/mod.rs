//! Streaming Aggregators
//!
//! Per-call state folded from an inbound item sequence. Each aggregator is
//! owned by the single task consuming the inbound side and is dropped with
//! the call.

mod average;
mod factorization;
mod maximum;

pub use average::RunningAverage;
pub use factorization::{PrimeFactors, Step};
pub use maximum::RunningMaximum;

use crate::domain::status::CallError;

/// Aggregation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AggregateError {
    /// The inbound sequence ended without a single item.
    #[error("cannot average an empty sequence")]
    EmptyInput,

    /// Factorization is only defined for positive integers.
    #[error("number must be positive, got {0}")]
    NonPositive(i64),
}

impl From<AggregateError> for CallError {
    fn from(err: AggregateError) -> Self {
        let field = match err {
            AggregateError::EmptyInput | AggregateError::NonPositive(_) => "number",
        };
        Self::invalid_argument(field, err.to_string())
    }
}
