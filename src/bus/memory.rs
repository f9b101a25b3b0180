//! In-process channel bus backed by tokio broadcast channels.

use crate::bus::{Bus, BusSubscriber};
use crate::defaults;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::broadcast;

/// In-memory bus: one broadcast channel per name, created on first use.
///
/// Each channel delivers in publish order to every live subscriber. A
/// subscriber that falls more than the channel capacity behind loses the
/// oldest messages (reported once per gap), keeping memory bounded.
pub struct MemoryBus {
    channels: Mutex<HashMap<String, broadcast::Sender<Vec<u8>>>>,
    capacity: usize,
}

impl MemoryBus {
    /// Creates a bus with the default per-channel capacity.
    pub fn new() -> Self {
        Self::with_capacity(defaults::BUS_CHANNEL_CAPACITY)
    }

    /// Creates a bus with a custom per-channel capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            capacity,
        }
    }

    /// Number of live subscribers on a channel.
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.channels
            .lock()
            .unwrap()
            .get(channel)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    fn sender(&self, channel: &str) -> broadcast::Sender<Vec<u8>> {
        let mut channels = self.channels.lock().unwrap();
        channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Bus for MemoryBus {
    async fn publish(&self, channel: &str, payload: Vec<u8>) -> Result<()> {
        // send errors only when there are no receivers; a zero-subscriber
        // publish is a no-op, not a failure.
        let _ = self.sender(channel).send(payload);
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> Result<Box<dyn BusSubscriber>> {
        let rx = self.sender(channel).subscribe();
        Ok(Box::new(MemorySubscriber {
            channel: channel.to_string(),
            rx,
        }))
    }
}

struct MemorySubscriber {
    channel: String,
    rx: broadcast::Receiver<Vec<u8>>,
}

#[async_trait]
impl BusSubscriber for MemorySubscriber {
    async fn next(&mut self) -> Option<Vec<u8>> {
        loop {
            match self.rx.recv().await {
                Ok(payload) => return Some(payload),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    eprintln!("[Bus] {} subscriber lagged, {n} messages dropped", self.channel);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    fn channel(&self) -> &str {
        &self.channel
    }
}
