//! Call Tracking
//!
//! Every served call holds a [`CallGuard`] from the moment it is opened until
//! a terminal status is known. For streaming responses that is when the
//! outbound sequence ends, not when the handler returns. A guard dropped
//! without a status means the call was abandoned and is recorded as
//! `Canceled`.

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};
use std::time::Instant;

use futures::StreamExt;
use serde::Serialize;
use tokio_stream::Stream;
use tonic::{Status, Streaming};

use super::BoxedStream;
use crate::application::session::Inbound;
use crate::domain::call::CallShape;
use crate::domain::status::{CallError, StatusCode};
use crate::infrastructure::metrics::{self, Direction};

#[derive(Debug, Default)]
struct ShapeCounters {
    in_flight: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
}

/// Snapshot of one shape's counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShapeStats {
    /// Shape label.
    pub shape: &'static str,
    /// Calls currently open.
    pub in_flight: u64,
    /// Calls that ended with `Ok`.
    pub completed: u64,
    /// Calls that ended with any other status.
    pub failed: u64,
}

/// In-flight and completed call counters per shape.
#[derive(Debug, Default)]
pub struct CallTracker {
    shapes: [ShapeCounters; 4],
}

impl CallTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a tracker slot for a call.
    #[must_use]
    pub fn begin(self: &Arc<Self>, method: &'static str, shape: CallShape) -> CallGuard {
        self.counters(shape).in_flight.fetch_add(1, Ordering::Relaxed);
        metrics::record_call_started(method, shape);
        metrics::increment_in_flight(shape);
        tracing::debug!(method, shape = shape.as_str(), "call opened");

        CallGuard {
            tracker: Arc::clone(self),
            method,
            shape,
            started: Instant::now(),
            settled: false,
        }
    }

    /// Calls of `shape` currently open.
    #[must_use]
    pub fn in_flight(&self, shape: CallShape) -> u64 {
        self.counters(shape).in_flight.load(Ordering::Relaxed)
    }

    /// Calls currently open across all shapes.
    #[must_use]
    pub fn total_in_flight(&self) -> u64 {
        CallShape::ALL.iter().map(|&s| self.in_flight(s)).sum()
    }

    /// Counters for every shape.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ShapeStats> {
        CallShape::ALL
            .iter()
            .map(|&shape| {
                let counters = self.counters(shape);
                ShapeStats {
                    shape: shape.as_str(),
                    in_flight: counters.in_flight.load(Ordering::Relaxed),
                    completed: counters.completed.load(Ordering::Relaxed),
                    failed: counters.failed.load(Ordering::Relaxed),
                }
            })
            .collect()
    }

    const fn counters(&self, shape: CallShape) -> &ShapeCounters {
        &self.shapes[shape.index()]
    }

    fn release(&self, shape: CallShape, status: StatusCode) {
        let counters = self.counters(shape);
        counters.in_flight.fetch_sub(1, Ordering::Relaxed);
        if status == StatusCode::Ok {
            counters.completed.fetch_add(1, Ordering::Relaxed);
        } else {
            counters.failed.fetch_add(1, Ordering::Relaxed);
        }
        metrics::decrement_in_flight(shape);
    }
}

/// Tracker slot of one open call.
#[derive(Debug)]
pub struct CallGuard {
    tracker: Arc<CallTracker>,
    method: &'static str,
    shape: CallShape,
    started: Instant,
    settled: bool,
}

impl CallGuard {
    /// Record the terminal status.
    pub fn finish(mut self, status: StatusCode) {
        self.close(status);
    }

    /// Record a unary outcome and convert its error for the transport.
    ///
    /// # Errors
    ///
    /// Returns the classified status when `result` is an error.
    pub fn settle<T>(self, result: Result<T, CallError>) -> Result<T, Status> {
        match result {
            Ok(value) => {
                self.finish(StatusCode::Ok);
                Ok(value)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Record a failure and convert it for the transport.
    #[must_use]
    pub fn fail(self, err: CallError) -> Status {
        self.finish(err.code());
        Status::from(err)
    }

    /// Hand the guard to an outbound sequence; the call ends with it.
    pub fn stream<T, S>(self, items: S) -> BoxedStream<T>
    where
        T: Send + 'static,
        S: Stream<Item = Result<T, CallError>> + Send + 'static,
    {
        Box::pin(TrackedStream {
            inner: items.boxed(),
            guard: Some(self),
        })
    }

    /// Adapt an inbound transport stream into a domain item sequence.
    pub fn inbound<M, T>(&self, streaming: Streaming<M>, convert: fn(M) -> T) -> Inbound<T>
    where
        M: Send + 'static,
        T: Send + 'static,
    {
        let method = self.method;
        streaming
            .map(move |item| {
                item.map(|message| {
                    metrics::record_stream_item(method, Direction::Inbound);
                    convert(message)
                })
                .map_err(CallError::from)
            })
            .boxed()
    }

    fn close(&mut self, status: StatusCode) {
        if self.settled {
            return;
        }
        self.settled = true;
        let elapsed = self.started.elapsed();
        self.tracker.release(self.shape, status);
        metrics::record_call_finished(self.method, self.shape, status, elapsed);

        #[allow(clippy::cast_possible_truncation)]
        let elapsed_ms = elapsed.as_millis() as u64;
        if status.is_expected() {
            tracing::debug!(
                method = self.method,
                shape = self.shape.as_str(),
                status = status.as_str(),
                elapsed_ms,
                "call finished"
            );
        } else {
            tracing::info!(
                method = self.method,
                shape = self.shape.as_str(),
                status = status.as_str(),
                elapsed_ms,
                "call ended abnormally"
            );
        }
    }
}

impl Drop for CallGuard {
    fn drop(&mut self) {
        self.close(StatusCode::Canceled);
    }
}

/// Outbound sequence that settles its call on end-of-sequence or error and
/// never yields after that.
struct TrackedStream<T> {
    inner: Pin<Box<dyn Stream<Item = Result<T, CallError>> + Send>>,
    guard: Option<CallGuard>,
}

impl<T> Stream for TrackedStream<T> {
    type Item = Result<T, Status>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let Some(guard) = this.guard.as_ref() else {
            return Poll::Ready(None);
        };
        let method = guard.method;

        match this.inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(item))) => {
                metrics::record_stream_item(method, Direction::Outbound);
                Poll::Ready(Some(Ok(item)))
            }
            Poll::Ready(Some(Err(err))) => {
                let status = match this.guard.take() {
                    Some(guard) => guard.fail(err),
                    None => Status::from(err),
                };
                Poll::Ready(Some(Err(status)))
            }
            Poll::Ready(None) => {
                if let Some(guard) = this.guard.take() {
                    guard.finish(StatusCode::Ok);
                }
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::stream;

    use super::*;

    #[test]
    fn guard_counts_in_flight_until_finished() {
        let tracker = Arc::new(CallTracker::new());
        let guard = tracker.begin("test.Unary", CallShape::Unary);
        assert_eq!(tracker.in_flight(CallShape::Unary), 1);
        assert_eq!(tracker.total_in_flight(), 1);

        guard.finish(StatusCode::Ok);
        assert_eq!(tracker.in_flight(CallShape::Unary), 0);
        assert_eq!(tracker.snapshot()[0].completed, 1);
    }

    #[test]
    fn dropped_guard_counts_as_failure() {
        let tracker = Arc::new(CallTracker::new());
        drop(tracker.begin("test.Bidi", CallShape::Bidirectional));

        let stats = &tracker.snapshot()[CallShape::Bidirectional.index()];
        assert_eq!(stats.in_flight, 0);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.shape, "bidirectional");
    }

    #[test]
    fn settle_maps_errors() {
        let tracker = Arc::new(CallTracker::new());
        let status = tracker
            .begin("test.Unary", CallShape::Unary)
            .settle::<()>(Err(CallError::not_found("gone")))
            .unwrap_err();
        assert_eq!(status.code(), tonic::Code::NotFound);
        assert_eq!(tracker.snapshot()[0].failed, 1);
    }

    #[tokio::test]
    async fn stream_settles_on_end() {
        let tracker = Arc::new(CallTracker::new());
        let guard = tracker.begin("test.Server", CallShape::ServerStreaming);
        let items: Vec<_> = guard
            .stream(stream::iter(vec![Ok(1), Ok(2)]))
            .collect()
            .await;

        assert_eq!(items.len(), 2);
        assert_eq!(tracker.in_flight(CallShape::ServerStreaming), 0);
        assert_eq!(
            tracker.snapshot()[CallShape::ServerStreaming.index()].completed,
            1
        );
    }

    #[tokio::test]
    async fn stream_stops_after_error() {
        let tracker = Arc::new(CallTracker::new());
        let guard = tracker.begin("test.Server", CallShape::ServerStreaming);
        let items: Vec<_> = guard
            .stream(stream::iter(vec![
                Ok(1),
                Err(CallError::internal("boom")),
                Ok(3),
            ]))
            .collect()
            .await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[1].as_ref().unwrap_err().code(), tonic::Code::Internal);
        assert_eq!(
            tracker.snapshot()[CallShape::ServerStreaming.index()].failed,
            1
        );
    }

    #[tokio::test]
    async fn dropping_unfinished_stream_cancels() {
        let tracker = Arc::new(CallTracker::new());
        let guard = tracker.begin("test.Server", CallShape::ServerStreaming);
        let mut body = guard.stream(stream::iter(vec![Ok(1), Ok(2)]));
        assert!(body.next().await.is_some());
        drop(body);

        let stats = &tracker.snapshot()[CallShape::ServerStreaming.index()];
        assert_eq!(stats.in_flight, 0);
        assert_eq!(stats.failed, 1);
    }
}
