//! Real-time relay: fans events out to every connected WebSocket client.
//!
//! Delivery is best effort. There is no acknowledgement, retry or replay; a
//! client that connects after a broadcast never sees it, and a client that
//! falls more than the buffer size behind loses the skipped events.

pub mod session;

use tokio::sync::broadcast;

use crate::api::metrics;
use crate::models::RelayEvent;

/// Publish side of the relay, injected into the services that emit events.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: RelayEvent);
}

#[derive(Clone)]
pub struct RelayHub {
    sender: broadcast::Sender<RelayEvent>,
}

impl RelayHub {
    pub fn new(buffer: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer.max(1));
        RelayHub { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RelayEvent> {
        self.sender.subscribe()
    }

    pub fn connection_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl EventPublisher for RelayHub {
    fn publish(&self, event: RelayEvent) {
        let name = event.name();
        match self.sender.send(event) {
            Ok(receivers) => log::debug!("📣 Relay '{}' delivered to {} connection(s)", name, receivers),
            Err(_) => log::debug!("📣 Relay '{}' dropped, no connections", name),
        }
        metrics::increment_relay_events();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CommentAdded, EdgePayload};

    #[tokio::test]
    async fn every_subscriber_receives_each_event() {
        let hub = RelayHub::new(8);
        let mut first = hub.subscribe();
        let mut second = hub.subscribe();
        assert_eq!(hub.connection_count(), 2);

        let event = RelayEvent::Follow(EdgePayload { user_id: "b".into(), follower_id: "a".into() });
        hub.publish(event.clone());

        assert_eq!(first.recv().await.unwrap(), event);
        assert_eq!(second.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn late_subscribers_miss_earlier_events() {
        let hub = RelayHub::new(8);
        hub.publish(RelayEvent::CommentAdded(CommentAdded { post_id: "p1".into() }));

        let mut late = hub.subscribe();
        hub.publish(RelayEvent::CommentAdded(CommentAdded { post_id: "p2".into() }));

        assert_eq!(
            late.recv().await.unwrap(),
            RelayEvent::CommentAdded(CommentAdded { post_id: "p2".into() })
        );
        assert!(late.try_recv().is_err());
    }

    #[test]
    fn publishing_without_connections_is_harmless() {
        let hub = RelayHub::new(1);
        hub.publish(RelayEvent::error("nobody listening"));
        assert_eq!(hub.connection_count(), 0);
    }

    #[tokio::test]
    async fn slow_subscribers_lose_overflowed_events() {
        let hub = RelayHub::new(2);
        let mut slow = hub.subscribe();
        for i in 0..4 {
            hub.publish(RelayEvent::CommentAdded(CommentAdded { post_id: format!("p{}", i) }));
        }

        assert!(matches!(slow.recv().await, Err(broadcast::error::RecvError::Lagged(2))));
        assert_eq!(
            slow.recv().await.unwrap(),
            RelayEvent::CommentAdded(CommentAdded { post_id: "p2".into() })
        );
    }
}
