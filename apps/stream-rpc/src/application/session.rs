//! Session Plumbing
//!
//! Item sequences shared by the use cases. The outbound side of a streaming
//! response is a bounded channel: a full buffer suspends the producer, and a
//! dropped receiver is how the producer learns that the caller abandoned the
//! call.

use futures::stream::BoxStream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::domain::status::CallError;

/// Inbound item sequence of a client-streaming or bidirectional call.
pub type Inbound<T> = BoxStream<'static, Result<T, CallError>>;

/// Outbound item sequence as seen by the transport adapter.
pub type OutboundStream<T> = ReceiverStream<Result<T, CallError>>;

/// The receiving side went away before the sequence ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("receiver abandoned the call")]
pub struct Abandoned;

/// Producer half of an outbound item sequence.
#[derive(Debug)]
pub struct Outbound<T> {
    tx: mpsc::Sender<Result<T, CallError>>,
}

impl<T> Clone for Outbound<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T: Send> Outbound<T> {
    /// Emit one item, waiting while the buffer is full.
    ///
    /// # Errors
    ///
    /// Returns [`Abandoned`] once the receiver has been dropped.
    pub async fn send(&self, item: T) -> Result<(), Abandoned> {
        self.tx.send(Ok(item)).await.map_err(|_| Abandoned)
    }

    /// Terminate the sequence with an error status. Best effort: a caller
    /// that already left never sees it.
    pub async fn fail(&self, err: CallError) {
        if self.tx.send(Err(err)).await.is_err() {
            tracing::debug!("failure status dropped, receiver already gone");
        }
    }

    /// Whether the receiver has been dropped.
    #[must_use]
    pub fn is_abandoned(&self) -> bool {
        self.tx.is_closed()
    }

    /// Resolves once the receiver has been dropped.
    pub async fn abandoned(&self) {
        self.tx.closed().await;
    }
}

/// Create a bounded outbound sequence.
#[must_use]
pub fn outbound<T>(capacity: usize) -> (Outbound<T>, OutboundStream<T>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (Outbound { tx }, ReceiverStream::new(rx))
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;

    #[tokio::test]
    async fn items_arrive_in_order_then_end() {
        let (tx, mut rx) = outbound::<u32>(4);
        tx.send(1).await.unwrap();
        tx.send(2).await.unwrap();
        drop(tx);

        assert_eq!(rx.next().await, Some(Ok(1)));
        assert_eq!(rx.next().await, Some(Ok(2)));
        assert_eq!(rx.next().await, None);
        assert_eq!(rx.next().await, None);
    }

    #[tokio::test]
    async fn dropping_receiver_is_observed_without_sending() {
        let (tx, rx) = outbound::<u32>(1);
        assert!(!tx.is_abandoned());
        drop(rx);
        tx.abandoned().await;
        assert!(tx.is_abandoned());
        assert_eq!(tx.send(7).await, Err(Abandoned));
    }

    #[tokio::test]
    async fn failure_is_delivered() {
        let (tx, mut rx) = outbound::<u32>(1);
        tx.fail(CallError::internal("boom")).await;
        drop(tx);
        assert_eq!(rx.next().await, Some(Err(CallError::internal("boom"))));
        assert_eq!(rx.next().await, None);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let (_tx, _rx) = outbound::<u32>(0);
    }
}
