//! Bus-to-hub relay loops.
//!
//! One relay per feed subscribes to the matching bus channel and forwards
//! every payload to the registry. The relay does not parse payloads; it
//! moves opaque bytes, so a malformed message on the bus reaches consumers
//! exactly as published and is their problem to reject.

use crate::bus::Bus;
use crate::error::{AdhopError, Result};
use crate::hub::registry::SubscriberRegistry;
use crate::protocol::Feed;
use crate::shutdown::ShutdownSignal;
use std::sync::Arc;

/// Forwards one bus channel into one hub feed.
pub struct Relay {
    bus: Arc<dyn Bus>,
    channel: String,
    feed: Feed,
    registry: Arc<SubscriberRegistry>,
}

impl Relay {
    /// Creates a relay from `channel` to `feed`.
    pub fn new(
        bus: Arc<dyn Bus>,
        channel: impl Into<String>,
        feed: Feed,
        registry: Arc<SubscriberRegistry>,
    ) -> Self {
        Self {
            bus,
            channel: channel.into(),
            feed,
            registry,
        }
    }

    /// Runs until shutdown or until the bus closes underneath it.
    pub async fn run(self, mut shutdown: ShutdownSignal) -> Result<()> {
        let mut sub = self.bus.subscribe(&self.channel).await?;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return Ok(()),
                msg = sub.next() => {
                    let Some(payload) = msg else {
                        return Err(AdhopError::BusClosed {
                            channel: self.channel.clone(),
                        });
                    };
                    self.registry.publish(self.feed, payload);
                }
            }
        }
    }
}
