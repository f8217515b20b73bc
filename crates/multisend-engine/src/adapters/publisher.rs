//! Completion record publishers.

use crate::domain::BatchCompleted;
use crate::ports::CompletionPublisher;
use tokio::sync::broadcast;
use tracing::debug;

/// Default capacity of the completion channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Fans completion records out to any number of subscribers.
#[derive(Debug, Clone)]
pub struct BroadcastPublisher {
    sender: broadcast::Sender<BatchCompleted>,
}

impl Default for BroadcastPublisher {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl BroadcastPublisher {
    /// Creates a publisher buffering up to `capacity` records per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Receive every record published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BatchCompleted> {
        self.sender.subscribe()
    }

    /// Active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl CompletionPublisher for BroadcastPublisher {
    fn publish(&self, record: &BatchCompleted) {
        if self.sender.send(record.clone()).is_err() {
            debug!(batch_id = %record.batch_id, "No subscribers for completion record");
        }
    }
}

/// No-op publisher for running without observers.
#[derive(Debug, Clone, Default)]
pub struct NoOpPublisher;

impl CompletionPublisher for NoOpPublisher {
    fn publish(&self, _record: &BatchCompleted) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Address, BatchId, DecimalAmount, U256};

    fn record() -> BatchCompleted {
        BatchCompleted {
            batch_id: BatchId::generate(),
            actor: Address::new([7u8; 20]),
            token: None,
            total_base_units: U256::from(10u64),
            total: DecimalAmount::from_parts(U256::from(10u64), 0),
            recipient_count: 2,
            reference: "0x01".to_string(),
        }
    }

    #[tokio::test]
    async fn test_broadcast_reaches_subscriber() {
        let publisher = BroadcastPublisher::default();
        let mut rx = publisher.subscribe();
        assert_eq!(publisher.subscriber_count(), 1);

        let sent = record();
        publisher.publish(&sent);
        assert_eq!(rx.recv().await.unwrap(), sent);
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        BroadcastPublisher::new(0).publish(&record());
        NoOpPublisher.publish(&record());
    }
}
