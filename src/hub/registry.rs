//! Per-feed subscriber registry for the fan-out hub.
//!
//! The registry is the single owner of the live consumer sets. Connection
//! tasks add and remove themselves; publishing snapshots the current set
//! and never holds the lock across an await point.

use crate::defaults;
use crate::protocol::Feed;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

/// Event delivered into a consumer's queue.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// One payload to forward to the consumer.
    Data(Vec<u8>),
    /// Terminal marker: the hub is shutting down.
    Done,
}

/// Registry of live feed consumers, keyed by feed.
pub struct SubscriberRegistry {
    feeds: Mutex<HashMap<Feed, HashMap<u64, mpsc::Sender<FeedEvent>>>>,
    next_id: AtomicU64,
    queue_len: usize,
}

impl SubscriberRegistry {
    /// Creates a registry with the default per-consumer queue length.
    pub fn new() -> Self {
        Self::with_queue_len(defaults::CONSUMER_QUEUE_LEN)
    }

    /// Creates a registry with a custom per-consumer queue length.
    pub fn with_queue_len(queue_len: usize) -> Self {
        Self {
            feeds: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
            queue_len,
        }
    }

    /// Registers a new consumer on a feed.
    ///
    /// Returns the consumer id (for `unsubscribe`) and the receiving end
    /// of its event queue.
    pub fn subscribe(&self, feed: Feed) -> (u64, mpsc::Receiver<FeedEvent>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.queue_len);
        self.feeds
            .lock()
            .unwrap()
            .entry(feed)
            .or_default()
            .insert(id, tx);
        (id, rx)
    }

    /// Removes a consumer from a feed. Removing twice is harmless.
    pub fn unsubscribe(&self, feed: Feed, id: u64) {
        let mut feeds = self.feeds.lock().unwrap();
        if let Some(consumers) = feeds.get_mut(&feed) {
            consumers.remove(&id);
        }
    }

    /// Number of live consumers on a feed.
    pub fn count(&self, feed: Feed) -> usize {
        self.feeds
            .lock()
            .unwrap()
            .get(&feed)
            .map(|c| c.len())
            .unwrap_or(0)
    }

    /// Delivers a payload to every current consumer of a feed.
    ///
    /// Fire-and-forget: a consumer whose queue is full or closed is pruned;
    /// the failure never affects delivery to the others. Publishing to a
    /// feed with no consumers does nothing. Returns the number of
    /// successful deliveries.
    pub fn publish(&self, feed: Feed, payload: Vec<u8>) -> usize {
        let snapshot: Vec<(u64, mpsc::Sender<FeedEvent>)> = {
            let feeds = self.feeds.lock().unwrap();
            match feeds.get(&feed) {
                Some(consumers) if !consumers.is_empty() => consumers
                    .iter()
                    .map(|(id, tx)| (*id, tx.clone()))
                    .collect(),
                _ => return 0,
            }
        };

        let mut delivered = 0;
        let mut stale = Vec::new();
        for (id, tx) in snapshot {
            match tx.try_send(FeedEvent::Data(payload.clone())) {
                Ok(()) => delivered += 1,
                Err(_) => stale.push(id),
            }
        }

        if !stale.is_empty() {
            let mut feeds = self.feeds.lock().unwrap();
            if let Some(consumers) = feeds.get_mut(&feed) {
                for id in &stale {
                    consumers.remove(id);
                }
            }
            eprintln!("[Hub] pruned {} stale {feed} consumer(s)", stale.len());
        }

        delivered
    }

    /// Pushes the terminal marker to every consumer and clears the
    /// registry, so connection tasks waiting on their queues return
    /// promptly during shutdown.
    pub fn shutdown(&self) {
        let mut feeds = self.feeds.lock().unwrap();
        for consumers in feeds.values() {
            for tx in consumers.values() {
                let _ = tx.try_send(FeedEvent::Done);
            }
        }
        feeds.clear();
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_and_count() {
        let registry = SubscriberRegistry::new();
        assert_eq!(registry.count(Feed::Audio), 0);

        let (_a, _rx_a) = registry.subscribe(Feed::Audio);
        let (_b, _rx_b) = registry.subscribe(Feed::Audio);
        let (_c, _rx_c) = registry.subscribe(Feed::State);

        assert_eq!(registry.count(Feed::Audio), 2);
        assert_eq!(registry.count(Feed::State), 1);
        assert_eq!(registry.count(Feed::Classifier), 0);
    }

    #[test]
    fn test_unsubscribe_removes_only_that_consumer() {
        let registry = SubscriberRegistry::new();
        let (a, _rx_a) = registry.subscribe(Feed::Audio);
        let (_b, _rx_b) = registry.subscribe(Feed::Audio);

        registry.unsubscribe(Feed::Audio, a);
        assert_eq!(registry.count(Feed::Audio), 1);

        // Double unsubscribe is harmless.
        registry.unsubscribe(Feed::Audio, a);
        assert_eq!(registry.count(Feed::Audio), 1);
    }

    #[test]
    fn test_publish_with_no_consumers_is_noop() {
        let registry = SubscriberRegistry::new();
        assert_eq!(registry.publish(Feed::Audio, vec![1, 2, 3]), 0);
    }

    #[tokio::test]
    async fn test_publish_reaches_all_consumers() {
        let registry = SubscriberRegistry::new();
        let (_a, mut rx_a) = registry.subscribe(Feed::Classifier);
        let (_b, mut rx_b) = registry.subscribe(Feed::Classifier);

        assert_eq!(registry.publish(Feed::Classifier, vec![7]), 2);

        assert_eq!(rx_a.recv().await, Some(FeedEvent::Data(vec![7])));
        assert_eq!(rx_b.recv().await, Some(FeedEvent::Data(vec![7])));
    }

    #[tokio::test]
    async fn test_publish_is_scoped_to_feed() {
        let registry = SubscriberRegistry::new();
        let (_a, mut rx_audio) = registry.subscribe(Feed::Audio);
        let (_b, mut rx_state) = registry.subscribe(Feed::State);

        registry.publish(Feed::State, vec![1]);

        assert_eq!(rx_state.recv().await, Some(FeedEvent::Data(vec![1])));
        assert!(rx_audio.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_dead_consumer_is_pruned_others_survive() {
        let registry = SubscriberRegistry::new();
        let (_a, rx_a) = registry.subscribe(Feed::Audio);
        let (_b, mut rx_b) = registry.subscribe(Feed::Audio);
        let (_c, mut rx_c) = registry.subscribe(Feed::Audio);

        // Consumer A hangs up.
        drop(rx_a);

        assert_eq!(registry.publish(Feed::Audio, vec![9]), 2);
        assert_eq!(registry.count(Feed::Audio), 2);

        assert_eq!(rx_b.recv().await, Some(FeedEvent::Data(vec![9])));
        assert_eq!(rx_c.recv().await, Some(FeedEvent::Data(vec![9])));
    }

    #[tokio::test]
    async fn test_slow_consumer_with_full_queue_is_pruned() {
        let registry = SubscriberRegistry::with_queue_len(2);
        let (_a, mut _rx_a) = registry.subscribe(Feed::Audio);

        // Fill the queue without draining it.
        registry.publish(Feed::Audio, vec![1]);
        registry.publish(Feed::Audio, vec![2]);
        assert_eq!(registry.count(Feed::Audio), 1);

        // Third delivery overflows: the consumer is dropped.
        assert_eq!(registry.publish(Feed::Audio, vec![3]), 0);
        assert_eq!(registry.count(Feed::Audio), 0);
    }

    #[tokio::test]
    async fn test_shutdown_sends_done_and_clears() {
        let registry = SubscriberRegistry::new();
        let (_a, mut rx_a) = registry.subscribe(Feed::Audio);
        let (_b, mut rx_b) = registry.subscribe(Feed::State);

        registry.shutdown();

        assert_eq!(rx_a.recv().await, Some(FeedEvent::Done));
        assert_eq!(rx_b.recv().await, Some(FeedEvent::Done));
        assert_eq!(registry.count(Feed::Audio), 0);
        assert_eq!(registry.count(Feed::State), 0);

        // Publishing after shutdown delivers to nobody.
        assert_eq!(registry.publish(Feed::Audio, vec![1]), 0);
    }

    #[test]
    fn test_consumer_ids_are_unique() {
        let registry = SubscriberRegistry::new();
        let (a, _rx_a) = registry.subscribe(Feed::Audio);
        let (b, _rx_b) = registry.subscribe(Feed::Audio);
        let (c, _rx_c) = registry.subscribe(Feed::State);
        assert_ne!(a, b);
        assert_ne!(b, c);
    }
}
