//! Composition root: wires the bus, the pipeline tasks, and the feed
//! server into one cancellable unit.

use crate::audio::source::AudioSource;
use crate::audio::streamer::{Streamer, StreamerConfig};
use crate::bus::Bus;
use crate::classify::classifier::Classifier;
use crate::classify::worker::{ClassifierWorker, ClassifierWorkerConfig};
use crate::config::Config;
use crate::control::state_machine::Stations;
use crate::control::tuner::Tuner;
use crate::control::worker::{StateMachineWorker, StateWorkerConfig};
use crate::defaults;
use crate::error::Result;
use crate::hub::registry::SubscriberRegistry;
use crate::hub::relay::Relay;
use crate::hub::server::FeedServer;
use crate::protocol::Feed;
use crate::shutdown::Shutdown;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// The assembled pipeline, ready to start.
pub struct App {
    config: Config,
    announce: bool,
}

impl App {
    /// Creates an app from a validated configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            announce: true,
        }
    }

    /// Suppress per-window and per-transition stderr output.
    pub fn quiet(mut self) -> Self {
        self.announce = false;
        self
    }

    /// Starts every pipeline task and the feed server.
    ///
    /// The audio source, classifier and tuner are capability seams; tests
    /// pass mocks, the binary passes real implementations.
    pub async fn start(
        &self,
        bus: Arc<dyn Bus>,
        source: Box<dyn AudioSource>,
        classifier: Arc<dyn Classifier>,
        tuner: Arc<dyn Tuner>,
    ) -> Result<AppHandle> {
        self.config.validate()?;

        let shutdown = Shutdown::new();
        let mut tasks: Vec<(&'static str, JoinHandle<Result<()>>)> = Vec::new();

        // Feed server and bus-to-hub relays.
        let registry = Arc::new(SubscriberRegistry::with_queue_len(
            self.config.hub.consumer_queue,
        ));
        let server = FeedServer::bind(&self.config.hub.listen, registry.clone()).await?;
        let feed_addr = server.local_addr()?;
        tasks.push(("feed server", tokio::spawn(server.run(shutdown.signal()))));

        for (channel, feed) in [
            (defaults::CHANNEL_AUDIO, Feed::Audio),
            (defaults::CHANNEL_CLASSIFIER, Feed::Classifier),
            (defaults::CHANNEL_STATE, Feed::State),
        ] {
            let relay = Relay::new(bus.clone(), channel, feed, registry.clone());
            tasks.push(("relay", tokio::spawn(relay.run(shutdown.signal()))));
        }

        // Classification dispatch.
        let classifier_worker = ClassifierWorker::new(
            bus.clone(),
            classifier,
            ClassifierWorkerConfig {
                window_samples: self.config.window_samples(),
                announce: self.announce,
                ..Default::default()
            },
        );
        tasks.push((
            "classifier",
            tokio::spawn(classifier_worker.run(shutdown.signal())),
        ));

        // Hysteresis control loop.
        let state_worker = StateMachineWorker::new(
            bus.clone(),
            tuner,
            StateWorkerConfig {
                stations: Stations {
                    primary: self.config.stations.primary,
                    secondary: self.config.stations.secondary,
                },
                announce: self.announce,
                ..Default::default()
            },
        );
        tasks.push((
            "state machine",
            tokio::spawn(state_worker.run(shutdown.signal())),
        ));

        // Let the consumer loops land their subscriptions before audio
        // flows; the bus only delivers to existing subscribers, and windows
        // assemble purely from post-subscribe audio.
        tokio::time::sleep(Duration::from_millis(10)).await;

        let streamer = Streamer::new(
            bus,
            StreamerConfig {
                batch_samples: self.config.batch_samples(),
                ..Default::default()
            },
        );
        tasks.push((
            "streamer",
            tokio::spawn(streamer.run(source, shutdown.signal())),
        ));

        Ok(AppHandle {
            shutdown,
            tasks,
            feed_addr,
        })
    }
}

/// Handle to the running pipeline.
pub struct AppHandle {
    shutdown: Shutdown,
    tasks: Vec<(&'static str, JoinHandle<Result<()>>)>,
    feed_addr: SocketAddr,
}

impl AppHandle {
    /// Address the feed server listens on.
    pub fn feed_addr(&self) -> SocketAddr {
        self.feed_addr
    }

    /// Signals every task to stop without waiting for them.
    pub fn trigger_shutdown(&self) {
        self.shutdown.trigger();
    }

    /// Stops the pipeline and waits for every task to finish.
    ///
    /// Task errors are reported on stderr; a task that ignores the signal
    /// for more than a few seconds is abandoned.
    pub async fn stop(self) {
        self.shutdown.trigger();

        for (name, task) in self.tasks {
            match tokio::time::timeout(Duration::from_secs(5), task).await {
                Ok(Ok(Ok(()))) => {}
                Ok(Ok(Err(e))) => eprintln!("adhop: {name} task failed: {e}"),
                Ok(Err(e)) => eprintln!("adhop: {name} task panicked: {e}"),
                Err(_) => eprintln!("adhop: {name} task ignored shutdown, detaching"),
            }
        }
    }
}
