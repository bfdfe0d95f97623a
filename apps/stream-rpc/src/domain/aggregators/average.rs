use super::AggregateError;

/// Running arithmetic mean over `i32` inputs.
///
/// The sum is kept in `i64`, so any sequence shorter than 2^32 items cannot
/// overflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunningAverage {
    sum: i64,
    count: u64,
}

impl RunningAverage {
    /// Empty aggregator.
    #[must_use]
    pub const fn new() -> Self {
        Self { sum: 0, count: 0 }
    }

    /// Fold one item in.
    pub fn push(&mut self, value: i32) {
        self.sum += i64::from(value);
        self.count += 1;
    }

    /// Number of items folded so far.
    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// Terminal value: `sum / count`.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::EmptyInput`] when nothing was pushed.
    #[allow(clippy::cast_precision_loss)]
    pub fn finish(self) -> Result<f64, AggregateError> {
        if self.count == 0 {
            return Err(AggregateError::EmptyInput);
        }
        Ok(self.sum as f64 / self.count as f64)
    }
}

impl Extend<i32> for RunningAverage {
    fn extend<I: IntoIterator<Item = i32>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}
