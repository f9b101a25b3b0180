//! Audio sources and the bus-facing streamer.

pub mod source;
pub mod streamer;
pub mod wav;

pub use source::{AudioSource, MockAudioSource};
pub use streamer::{Streamer, StreamerConfig};
pub use wav::WavAudioSource;
