//! Fan-out broadcast hub.
//!
//! Relays bus traffic to any number of live TCP consumers, one feed per
//! connection:
//!
//! ```text
//! radio:audio ──────┐
//! radio:classifier ─┼─▶ SubscriberRegistry ──▶ TCP consumers
//! radio:state ──────┘        (FeedServer)
//! ```
//!
//! Consumers that disconnect or fall behind are pruned; publishers never
//! wait on them.

pub mod registry;
pub mod relay;
pub mod server;

pub use registry::{FeedEvent, SubscriberRegistry};
pub use relay::Relay;
pub use server::FeedServer;
