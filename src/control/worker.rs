//! State machine listen loop: classifier channel in, state channel out.

use crate::bus::Bus;
use crate::control::state_machine::{StateMachine, Stations};
use crate::control::tuner::Tuner;
use crate::defaults;
use crate::error::{AdhopError, Result};
use crate::protocol::ClassificationMessage;
use crate::shutdown::ShutdownSignal;
use std::sync::Arc;

/// Configuration for the state machine worker.
#[derive(Debug, Clone)]
pub struct StateWorkerConfig {
    /// Bus channel classifications arrive on.
    pub classifier_channel: String,
    /// Bus channel state changes are published on.
    pub state_channel: String,
    /// The station pair to steer between.
    pub stations: Stations,
    /// Print transitions to stderr.
    pub announce: bool,
}

impl Default for StateWorkerConfig {
    fn default() -> Self {
        Self {
            classifier_channel: defaults::CHANNEL_CLASSIFIER.to_string(),
            state_channel: defaults::CHANNEL_STATE.to_string(),
            stations: Stations {
                primary: defaults::PRIMARY_STATION_HZ,
                secondary: defaults::SECONDARY_STATION_HZ,
            },
            announce: true,
        }
    }
}

/// Runs the hysteresis state machine against the live label stream.
pub struct StateMachineWorker {
    bus: Arc<dyn Bus>,
    tuner: Arc<dyn Tuner>,
    config: StateWorkerConfig,
}

impl StateMachineWorker {
    /// Creates a worker steering the given tuner.
    pub fn new(bus: Arc<dyn Bus>, tuner: Arc<dyn Tuner>, config: StateWorkerConfig) -> Self {
        Self { bus, tuner, config }
    }

    /// Runs until shutdown or until the bus closes underneath it.
    ///
    /// Malformed classifier messages are logged and dropped. Identity
    /// transitions publish nothing. Retune failures never roll the state
    /// back.
    pub async fn run(self, mut shutdown: ShutdownSignal) -> Result<()> {
        let mut sub = self.bus.subscribe(&self.config.classifier_channel).await?;
        let mut machine = StateMachine::new(self.config.stations);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return Ok(()),
                msg = sub.next() => {
                    let Some(payload) = msg else {
                        return Err(AdhopError::BusClosed {
                            channel: self.config.classifier_channel.clone(),
                        });
                    };

                    let message = match std::str::from_utf8(&payload)
                        .map_err(|e| e.to_string())
                        .and_then(|s| {
                            ClassificationMessage::from_json(s).map_err(|e| e.to_string())
                        }) {
                        Ok(message) => message,
                        Err(e) => {
                            eprintln!("[FSM] dropping malformed classifier message: {e}");
                            continue;
                        }
                    };

                    let Some(transition) = machine.apply(message.label) else {
                        continue;
                    };

                    if self.config.announce {
                        eprintln!("[FSM] Transition: {} → {}", transition.from, transition.to);
                    }

                    let state_msg = machine.execute(&transition, &self.tuner);
                    let json = match state_msg.to_json() {
                        Ok(json) => json,
                        Err(e) => {
                            eprintln!("[FSM] failed to serialize state message: {e}");
                            continue;
                        }
                    };
                    self.bus
                        .publish(&self.config.state_channel, json.into_bytes())
                        .await?;
                }
            }
        }
    }
}
