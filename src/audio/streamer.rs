//! Audio streamer: pumps source samples onto the bus in fixed batches.
//!
//! The source is polled on a dedicated thread (it may block on hardware);
//! an async task slices the incoming samples into exact batches and
//! publishes them as f32le PCM on the audio channel.

use crate::audio::source::AudioSource;
use crate::bus::Bus;
use crate::defaults;
use crate::error::Result;
use crate::protocol;
use crate::shutdown::ShutdownSignal;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc;

/// Configuration for the audio streamer.
#[derive(Debug, Clone)]
pub struct StreamerConfig {
    /// Bus channel audio batches are published on.
    pub channel: String,
    /// Exact number of samples per published batch.
    pub batch_samples: usize,
    /// Polling interval when the source has nothing yet (ms).
    pub poll_interval_ms: u64,
    /// Capture-thread to publish-task queue length, in reads.
    pub queue_len: usize,
}

impl Default for StreamerConfig {
    fn default() -> Self {
        Self {
            channel: defaults::CHANNEL_AUDIO.to_string(),
            batch_samples: defaults::batch_samples(defaults::SAMPLE_RATE, defaults::BATCH_MS),
            poll_interval_ms: 10,
            queue_len: 64,
        }
    }
}

/// Streams batches of audio samples from a source onto the bus.
pub struct Streamer {
    bus: Arc<dyn Bus>,
    config: StreamerConfig,
}

impl Streamer {
    /// Creates a streamer publishing on the given bus.
    pub fn new(bus: Arc<dyn Bus>, config: StreamerConfig) -> Self {
        Self { bus, config }
    }

    /// Runs until the source is exhausted, capture fails persistently, or
    /// shutdown is triggered. A partial trailing batch is discarded.
    pub async fn run(
        self,
        mut source: Box<dyn AudioSource>,
        mut shutdown: ShutdownSignal,
    ) -> Result<()> {
        source.start()?;

        let running = Arc::new(AtomicBool::new(true));
        let (tx, mut rx) = mpsc::channel::<Vec<f32>>(self.config.queue_len);

        let capture_running = running.clone();
        let poll_interval = Duration::from_millis(self.config.poll_interval_ms);
        let capture = thread::spawn(move || {
            let mut consecutive_errors: u32 = 0;
            const MAX_CONSECUTIVE_ERRORS: u32 = 10;

            while capture_running.load(Ordering::SeqCst) {
                let samples = match source.read_samples() {
                    Ok(s) => {
                        consecutive_errors = 0;
                        s
                    }
                    Err(e) => {
                        consecutive_errors += 1;
                        if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                            eprintln!(
                                "[Streamer] audio read failed {consecutive_errors} times in a row: {e}"
                            );
                            break;
                        }
                        thread::sleep(poll_interval);
                        continue;
                    }
                };

                if samples.is_empty() {
                    if source.is_finite() {
                        // File source exhausted.
                        break;
                    }
                    thread::sleep(poll_interval);
                    continue;
                }

                if tx.blocking_send(samples).is_err() {
                    break;
                }
            }

            if let Err(e) = source.stop() {
                eprintln!("[Streamer] failed to stop audio source: {e}");
            }
        });

        let mut buffer: Vec<f32> = Vec::new();
        let batch = self.config.batch_samples;

        let result = loop {
            tokio::select! {
                _ = shutdown.cancelled() => break Ok(()),
                read = rx.recv() => {
                    let Some(samples) = read else {
                        // Capture thread ended (source exhausted or failed).
                        break Ok(());
                    };
                    buffer.extend_from_slice(&samples);

                    let mut publish_err = None;
                    while buffer.len() >= batch {
                        let rest = buffer.split_off(batch);
                        let payload = protocol::encode_samples(&buffer);
                        buffer = rest;
                        if let Err(e) = self.bus.publish(&self.config.channel, payload).await {
                            publish_err = Some(e);
                            break;
                        }
                    }
                    if let Some(e) = publish_err {
                        break Err(e);
                    }
                }
            }
        };

        // Stop the capture thread and let it clean up the source.
        running.store(false, Ordering::SeqCst);
        rx.close();
        if capture.join().is_err() {
            eprintln!("[Streamer] capture thread panicked");
        }

        result
    }
}
