//! Classifier worker: audio channel in, classification channel out.
//!
//! Consumes audio batches from the bus, assembles full windows, runs the
//! classifier on the blocking pool, and publishes validated results. One
//! inference is in flight at a time; the bus buffers batches while the
//! classifier works, and the window assembler drops the oldest audio if the
//! backlog outgrows one window.

use crate::bus::Bus;
use crate::classify::classifier::Classifier;
use crate::classify::window::WindowAssembler;
use crate::defaults;
use crate::error::{AdhopError, Result};
use crate::protocol::{self, ClassificationMessage};
use crate::shutdown::ShutdownSignal;
use std::sync::Arc;

/// Configuration for the classifier worker.
#[derive(Debug, Clone)]
pub struct ClassifierWorkerConfig {
    /// Bus channel audio batches arrive on.
    pub audio_channel: String,
    /// Bus channel classifications are published on.
    pub classifier_channel: String,
    /// Samples per classification window.
    pub window_samples: usize,
    /// Print each result to stderr.
    pub announce: bool,
}

impl Default for ClassifierWorkerConfig {
    fn default() -> Self {
        Self {
            audio_channel: defaults::CHANNEL_AUDIO.to_string(),
            classifier_channel: defaults::CHANNEL_CLASSIFIER.to_string(),
            window_samples: defaults::window_samples(defaults::SAMPLE_RATE, defaults::WINDOW_SECS),
            announce: false,
        }
    }
}

/// Drives the classification oracle over the window stream.
pub struct ClassifierWorker {
    bus: Arc<dyn Bus>,
    classifier: Arc<dyn Classifier>,
    config: ClassifierWorkerConfig,
}

impl ClassifierWorker {
    /// Creates a worker dispatching windows to the given classifier.
    pub fn new(
        bus: Arc<dyn Bus>,
        classifier: Arc<dyn Classifier>,
        config: ClassifierWorkerConfig,
    ) -> Self {
        Self {
            bus,
            classifier,
            config,
        }
    }

    /// Runs until shutdown or until the bus closes underneath it.
    ///
    /// Per-window failures (oracle errors, invalid results) and malformed
    /// audio payloads are logged and dropped; the next window proceeds
    /// unaffected.
    pub async fn run(self, mut shutdown: ShutdownSignal) -> Result<()> {
        let mut sub = self.bus.subscribe(&self.config.audio_channel).await?;
        let mut assembler = WindowAssembler::new(self.config.window_samples);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    // Partial window is discarded with the assembler.
                    return Ok(());
                }
                msg = sub.next() => {
                    let Some(payload) = msg else {
                        return Err(AdhopError::BusClosed {
                            channel: self.config.audio_channel.clone(),
                        });
                    };

                    let batch = match protocol::decode_samples(&payload) {
                        Ok(batch) => batch,
                        Err(e) => {
                            eprintln!("[Classifier] dropping malformed audio payload: {e}");
                            continue;
                        }
                    };

                    let Some(window) = assembler.ingest(batch) else {
                        continue;
                    };

                    if let Some(message) = self.classify_window(window).await {
                        let json = match message.to_json() {
                            Ok(json) => json,
                            Err(e) => {
                                eprintln!("[Classifier] failed to serialize result: {e}");
                                continue;
                            }
                        };
                        self.bus
                            .publish(&self.config.classifier_channel, json.into_bytes())
                            .await?;
                    }
                }
            }
        }
    }

    /// Runs one window through the oracle on the blocking pool.
    ///
    /// Returns `None` when the window must be dropped: oracle failure,
    /// panicked inference, or a result that fails validation. No retry;
    /// the next window arrives shortly anyway.
    async fn classify_window(&self, window: Vec<f32>) -> Option<ClassificationMessage> {
        let classifier = self.classifier.clone();
        let result =
            tokio::task::spawn_blocking(move || classifier.classify(&window)).await;

        let classification = match result {
            Ok(Ok(c)) => c,
            Ok(Err(e)) => {
                eprintln!("[Classifier] window dropped: {e}");
                return None;
            }
            Err(e) => {
                eprintln!("[Classifier] inference task panicked: {e}");
                return None;
            }
        };

        if let Err(e) = classification.validate() {
            eprintln!("[Classifier] rejecting result: {e}");
            return None;
        }

        if self.config.announce {
            eprintln!(
                "[Classifier] {} (p={:?})",
                classification.label, classification.probs
            );
        }

        Some(ClassificationMessage {
            label: classification.label,
            probs: classification.probs,
        })
    }
}
