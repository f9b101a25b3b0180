//! adhop - Radio ad detection and automatic station hopping
//!
//! Monitors a live radio audio stream, classifies each 10-second window as
//! song or ad, and hops to a fallback station for the duration of ad breaks.
//! Raw audio, classifications and state changes fan out to live TCP
//! consumers.

// Enforce error handling discipline outside tests
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod app;
pub mod audio;
pub mod bus;
pub mod classify;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod control;
pub mod defaults;
pub mod error;
pub mod hub;
pub mod protocol;
pub mod shutdown;

// Capability seams (source → classify → control)
pub use audio::source::AudioSource;
pub use classify::classifier::Classifier;
pub use control::tuner::Tuner;

// Pipeline
pub use app::{App, AppHandle};
pub use bus::{Bus, BusSubscriber, MemoryBus};

// Core types
pub use classify::classifier::{Classification, Label};
pub use classify::window::WindowAssembler;
pub use control::state_machine::{ControlState, StateMachine, Stations};
pub use protocol::{ClassificationMessage, Feed, StateMessage};

// Error handling
pub use error::{AdhopError, Result};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
