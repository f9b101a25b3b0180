//! Channel bus seam.
//!
//! The pipeline stages talk to each other through an ordered, named-channel
//! publish/subscribe transport. The trait keeps the transport pluggable: the
//! in-process [`MemoryBus`] is what ships, a networked broker can slot in
//! behind the same interface.

pub mod memory;

use crate::error::Result;
use async_trait::async_trait;

pub use memory::MemoryBus;

/// Trait for an ordered publish/subscribe transport with named channels.
///
/// Ordering is guaranteed per channel only; messages on different channels
/// interleave arbitrarily.
#[async_trait]
pub trait Bus: Send + Sync {
    /// Publish a payload to all current subscribers of a channel.
    ///
    /// Publishing to a channel nobody subscribes to is a cheap no-op,
    /// not an error.
    async fn publish(&self, channel: &str, payload: Vec<u8>) -> Result<()>;

    /// Subscribe to a channel. Delivery starts with the next publish.
    async fn subscribe(&self, channel: &str) -> Result<Box<dyn BusSubscriber>>;
}

/// A live subscription to one bus channel.
///
/// Dropping the subscriber unsubscribes.
#[async_trait]
pub trait BusSubscriber: Send {
    /// Waits for the next message on the channel.
    ///
    /// Returns `None` when the bus side of the channel is gone; a loop
    /// driving a subscription treats that as transport loss.
    async fn next(&mut self) -> Option<Vec<u8>>;

    /// The channel this subscription is attached to.
    fn channel(&self) -> &str;
}
