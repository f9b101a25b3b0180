use crate::defaults;
use crate::error::{AdhopError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
#[cfg(feature = "cli")]
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub stations: StationsConfig,
    pub audio: AudioConfig,
    pub bus: BusConfig,
    pub hub: HubConfig,
}

/// The station pair the control loop hops between
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StationsConfig {
    /// Primary station frequency in Hz
    pub primary: f64,
    /// Secondary station frequency in Hz, used during ad breaks
    pub secondary: f64,
}

/// Audio stream configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    /// Duration of one published batch in milliseconds
    pub batch_ms: u32,
    /// Duration of one classification window in seconds
    pub window_secs: u32,
}

/// In-process bus configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BusConfig {
    /// Per-channel buffer capacity in messages
    pub capacity: usize,
}

/// Live feed server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HubConfig {
    /// TCP listen address for feed consumers
    pub listen: String,
    /// Per-consumer outbound queue length
    pub consumer_queue: usize,
}

impl Default for StationsConfig {
    fn default() -> Self {
        Self {
            primary: defaults::PRIMARY_STATION_HZ,
            secondary: defaults::SECONDARY_STATION_HZ,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: defaults::SAMPLE_RATE,
            batch_ms: defaults::BATCH_MS,
            window_secs: defaults::WINDOW_SECS,
        }
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            capacity: defaults::BUS_CHANNEL_CAPACITY,
        }
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            listen: defaults::FEED_LISTEN_ADDR.to_string(),
            consumer_queue: defaults::CONSUMER_QUEUE_LEN,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Missing fields use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AdhopError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                AdhopError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if the file
    /// doesn't exist. Invalid TOML is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(AdhopError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - ADHOP_PRIMARY_STATION → stations.primary (Hz)
    /// - ADHOP_SECONDARY_STATION → stations.secondary (Hz)
    /// - ADHOP_LISTEN → hub.listen
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(value) = std::env::var("ADHOP_PRIMARY_STATION")
            && let Ok(hz) = value.trim().parse::<f64>()
        {
            self.stations.primary = hz;
        }

        if let Ok(value) = std::env::var("ADHOP_SECONDARY_STATION")
            && let Ok(hz) = value.trim().parse::<f64>()
        {
            self.stations.secondary = hz;
        }

        if let Ok(listen) = std::env::var("ADHOP_LISTEN")
            && !listen.is_empty()
        {
            self.hub.listen = listen;
        }

        self
    }

    /// Rejects configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate == 0 {
            return Err(AdhopError::ConfigInvalidValue {
                key: "audio.sample_rate".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.audio.batch_ms == 0 {
            return Err(AdhopError::ConfigInvalidValue {
                key: "audio.batch_ms".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.audio.window_secs == 0 {
            return Err(AdhopError::ConfigInvalidValue {
                key: "audio.window_secs".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if u64::from(self.audio.batch_ms) > u64::from(self.audio.window_secs) * 1000 {
            return Err(AdhopError::ConfigInvalidValue {
                key: "audio.batch_ms".to_string(),
                message: "batch must not be longer than the window".to_string(),
            });
        }
        if !(self.stations.primary.is_finite() && self.stations.primary > 0.0) {
            return Err(AdhopError::ConfigInvalidValue {
                key: "stations.primary".to_string(),
                message: "must be a positive frequency in Hz".to_string(),
            });
        }
        if !(self.stations.secondary.is_finite() && self.stations.secondary > 0.0) {
            return Err(AdhopError::ConfigInvalidValue {
                key: "stations.secondary".to_string(),
                message: "must be a positive frequency in Hz".to_string(),
            });
        }
        if self.bus.capacity == 0 {
            return Err(AdhopError::ConfigInvalidValue {
                key: "bus.capacity".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.hub.consumer_queue == 0 {
            return Err(AdhopError::ConfigInvalidValue {
                key: "hub.consumer_queue".to_string(),
                message: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Samples per published batch.
    pub fn batch_samples(&self) -> usize {
        defaults::batch_samples(self.audio.sample_rate, self.audio.batch_ms)
    }

    /// Samples per classification window.
    pub fn window_samples(&self) -> usize {
        defaults::window_samples(self.audio.sample_rate, self.audio.window_secs)
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/adhop/config.toml on Linux
    #[cfg(feature = "cli")]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("adhop").join("config.toml"))
    }
}
