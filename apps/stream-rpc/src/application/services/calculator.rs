//! Calculator use cases.

use futures::StreamExt;

use crate::application::session::{Inbound, OutboundStream, outbound};
use crate::domain::aggregators::{PrimeFactors, RunningAverage, RunningMaximum, Step};
use crate::domain::calculator;
use crate::domain::status::CallError;

/// Tuning for the calculator streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalculatorSettings {
    /// Outbound channel capacity per call.
    pub stream_buffer: usize,
    /// Trial divisions per factorization slice before yielding.
    pub factor_budget: u32,
}

impl Default for CalculatorSettings {
    fn default() -> Self {
        Self {
            stream_buffer: 16,
            factor_budget: 10_000,
        }
    }
}

/// Calculator use cases.
#[derive(Debug, Clone, Default)]
pub struct CalculatorService {
    settings: CalculatorSettings,
}

impl CalculatorService {
    /// Create the service.
    #[must_use]
    pub const fn new(settings: CalculatorSettings) -> Self {
        Self { settings }
    }

    /// Add two numbers.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` on 32-bit overflow.
    pub fn sum(&self, first: i32, second: i32) -> Result<i32, CallError> {
        calculator::sum(first, second)
    }

    /// Square root.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for negative input.
    pub fn square_root(&self, number: i32) -> Result<f64, CallError> {
        calculator::square_root(number)
    }

    /// Stream the prime factors of `number`.
    ///
    /// Validation happens before the producer is spawned, so a bad input fails
    /// the call without emitting anything. The producer works in bounded
    /// slices and stops as soon as the caller abandons the sequence.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for `number <= 0`.
    pub fn prime_number_decomposition(
        &self,
        number: i64,
    ) -> Result<OutboundStream<i64>, CallError> {
        let mut factors = PrimeFactors::new(number)?;
        let budget = self.settings.factor_budget;
        let (tx, rx) = outbound(self.settings.stream_buffer);

        tokio::spawn(async move {
            loop {
                match factors.advance(budget) {
                    Step::Factor(factor) => {
                        if tx.send(factor).await.is_err() {
                            tracing::debug!(number, "factorization abandoned by caller");
                            return;
                        }
                    }
                    Step::Pending => {
                        if tx.is_abandoned() {
                            tracing::debug!(
                                number,
                                remaining = factors.remaining(),
                                "factorization abandoned mid-slice"
                            );
                            return;
                        }
                        tokio::task::yield_now().await;
                    }
                    Step::Done => return,
                }
            }
        });

        Ok(rx)
    }

    /// Fold the inbound numbers into their average.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty sequence, or the inbound sequence's own
    /// error.
    pub async fn compute_average(&self, mut inbound: Inbound<i32>) -> Result<f64, CallError> {
        let mut average = RunningAverage::new();
        while let Some(item) = inbound.next().await {
            average.push(item?);
        }
        tracing::debug!(count = average.count(), "average input closed");
        Ok(average.finish()?)
    }

    /// Emit every new maximum of the inbound numbers as it is seen.
    ///
    /// Inbound consumption runs in its own task; the returned sequence ends
    /// when the inbound side closes.
    #[must_use]
    pub fn find_maximum(&self, mut inbound: Inbound<i32>) -> OutboundStream<i32> {
        let (tx, rx) = outbound(self.settings.stream_buffer);

        tokio::spawn(async move {
            let mut maximum = RunningMaximum::new();
            loop {
                let item = tokio::select! {
                    () = tx.abandoned() => {
                        tracing::debug!("maximum stream abandoned by caller");
                        return;
                    }
                    item = inbound.next() => item,
                };
                match item {
                    Some(Ok(number)) => {
                        if let Some(max) = maximum.observe(number)
                            && tx.send(max).await.is_err()
                        {
                            return;
                        }
                    }
                    Some(Err(err)) => {
                        tx.fail(err).await;
                        return;
                    }
                    None => return,
                }
            }
        });

        rx
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::stream;

    use super::*;
    use crate::domain::status::StatusCode;

    fn inbound(values: &[i32]) -> Inbound<i32> {
        stream::iter(values.iter().copied().map(Ok).collect::<Vec<_>>()).boxed()
    }

    #[tokio::test]
    async fn decomposes_into_primes() {
        let service = CalculatorService::default();
        let factors: Vec<i64> = service
            .prime_number_decomposition(124_538_982)
            .unwrap()
            .map(Result::unwrap)
            .collect()
            .await;
        assert_eq!(factors, vec![2, 3, 617, 33_641]);
    }

    #[tokio::test]
    async fn abandoned_factorization_stops_working() {
        let service = CalculatorService::new(CalculatorSettings {
            stream_buffer: 1,
            factor_budget: 1_000,
        });
        let runtime = tokio::runtime::Handle::current().metrics();
        let before = runtime.num_alive_tasks();

        // 2^61 - 1 is prime: trial division runs for a very long time.
        let factors = service
            .prime_number_decomposition(2_305_843_009_213_693_951)
            .unwrap();
        tokio::task::yield_now().await;
        assert_eq!(runtime.num_alive_tasks(), before + 1);

        drop(factors);
        tokio::time::timeout(Duration::from_secs(5), async {
            while runtime.num_alive_tasks() > before {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("producer kept running after abandonment");
    }

    #[tokio::test]
    async fn tiny_budget_still_completes() {
        let service = CalculatorService::new(CalculatorSettings {
            stream_buffer: 1,
            factor_budget: 1,
        });
        let factors: Vec<i64> = service
            .prime_number_decomposition(9_973 * 2)
            .unwrap()
            .map(Result::unwrap)
            .collect()
            .await;
        assert_eq!(factors, vec![2, 9_973]);
    }

    #[tokio::test]
    async fn non_positive_decomposition_is_rejected() {
        let err = CalculatorService::default()
            .prime_number_decomposition(0)
            .unwrap_err();
        assert_eq!(err.code(), StatusCode::InvalidArgument);
    }

    #[tokio::test]
    async fn averages_inbound_numbers() {
        let avg = CalculatorService::default()
            .compute_average(inbound(&[1, 2, 3, 4]))
            .await
            .unwrap();
        assert!((avg - 2.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn empty_average_is_invalid_argument() {
        let err = CalculatorService::default()
            .compute_average(inbound(&[]))
            .await
            .unwrap_err();
        assert_eq!(err.code(), StatusCode::InvalidArgument);
    }

    #[tokio::test]
    async fn inbound_error_ends_average() {
        let items = stream::iter(vec![Ok(1), Err(CallError::Canceled("gone".into()))]).boxed();
        let err = CalculatorService::default()
            .compute_average(items)
            .await
            .unwrap_err();
        assert_eq!(err.code(), StatusCode::Canceled);
    }

    #[tokio::test]
    async fn maximum_emits_strict_increases() {
        let maxima: Vec<i32> = CalculatorService::default()
            .find_maximum(inbound(&[4, 7, 2, 19, 4, 6, 32]))
            .map(Result::unwrap)
            .collect()
            .await;
        assert_eq!(maxima, vec![4, 7, 19, 32]);
    }

    #[tokio::test]
    async fn maximum_task_stops_when_caller_leaves() {
        let (in_tx, in_rx) = tokio::sync::mpsc::channel::<Result<i32, CallError>>(1);
        let rx = CalculatorService::default()
            .find_maximum(tokio_stream::wrappers::ReceiverStream::new(in_rx).boxed());
        drop(rx);

        // The consumer task drops the inbound receiver once it notices.
        tokio::time::timeout(Duration::from_secs(1), in_tx.closed())
            .await
            .unwrap();
    }
}
