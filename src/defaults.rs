//! Default configuration constants for adhop.
//!
//! This module provides shared constants used across different configuration types
//! to ensure consistency and eliminate duplication.

/// Default audio sample rate in Hz.
///
/// 16kHz matches the rate the classification model is trained at and keeps
/// a 10s window at a manageable 160k samples.
pub const SAMPLE_RATE: u32 = 16_000;

/// Duration of one published audio batch in milliseconds.
///
/// The audio source emits one bus publish per batch. 100ms keeps fan-out
/// latency low without flooding the bus.
pub const BATCH_MS: u32 = 100;

/// Duration of one classification window in seconds.
///
/// Every full window is handed to the classifier as a single unit.
/// 10s of audio gives the model enough context to tell a song from an
/// ad break.
pub const WINDOW_SECS: u32 = 10;

/// Bus channel carrying raw audio batches (little-endian f32 PCM).
pub const CHANNEL_AUDIO: &str = "radio:audio";

/// Bus channel carrying classification results (JSON).
pub const CHANNEL_CLASSIFIER: &str = "radio:classifier";

/// Bus channel carrying control-state changes (JSON).
pub const CHANNEL_STATE: &str = "radio:state";

/// Default primary station frequency in Hz.
pub const PRIMARY_STATION_HZ: f64 = 100.304e6;

/// Default secondary station frequency in Hz, hopped to during ad breaks.
pub const SECONDARY_STATION_HZ: f64 = 104.5e6;

/// Default listen address for the live feed server.
pub const FEED_LISTEN_ADDR: &str = "127.0.0.1:7071";

/// Tolerance when checking that a probability vector sums to 1.
pub const PROB_SUM_TOLERANCE: f32 = 1e-3;

/// Per-consumer outbound queue length on the feed server.
///
/// A consumer whose queue fills up is treated as dead and pruned; there is
/// no backpressure from consumers onto the pipeline.
pub const CONSUMER_QUEUE_LEN: usize = 64;

/// Per-channel buffer capacity of the in-memory bus.
///
/// At 100ms batches this holds ~25s of audio, enough to ride out one slow
/// classifier inference without dropping messages.
pub const BUS_CHANNEL_CAPACITY: usize = 256;

/// Returns the number of samples in one batch at the given rate.
pub fn batch_samples(sample_rate: u32, batch_ms: u32) -> usize {
    (sample_rate as u64 * batch_ms as u64 / 1000) as usize
}

/// Returns the number of samples in one classification window at the given rate.
pub fn window_samples(sample_rate: u32, window_secs: u32) -> usize {
    (sample_rate as u64 * window_secs as u64) as usize
}
