use crate::error::{AdhopError, Result};
use std::sync::{Arc, Mutex};

/// Trait for the external station-switch action.
///
/// This trait allows swapping implementations (a real receiver vs a mock).
/// Implementations should return quickly; a retune that hangs stalls the
/// control loop.
pub trait Tuner: Send + Sync {
    /// Tune the receiver to the given station frequency in Hz.
    fn retune(&self, station_hz: f64) -> Result<()>;
}

/// Tuner that only announces retunes on stderr.
///
/// Stands in when no receiver is attached, e.g. in replay mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTuner;

impl Tuner for LogTuner {
    fn retune(&self, station_hz: f64) -> Result<()> {
        eprintln!("[Tuner] retune to {:.3} MHz", station_hz / 1e6);
        Ok(())
    }
}

/// Mock tuner for testing. Records every retune it receives.
#[derive(Debug, Clone, Default)]
pub struct MockTuner {
    calls: Arc<Mutex<Vec<f64>>>,
    should_fail: bool,
}

impl MockTuner {
    /// Create a new mock tuner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the mock to fail on retune. Failed calls are still recorded.
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// The stations retuned to so far, in order.
    pub fn retunes(&self) -> Vec<f64> {
        self.calls.lock().unwrap().clone()
    }
}

impl Tuner for MockTuner {
    fn retune(&self, station_hz: f64) -> Result<()> {
        self.calls.lock().unwrap().push(station_hz);
        if self.should_fail {
            Err(AdhopError::Tuner {
                message: "mock retune failure".to_string(),
            })
        } else {
            Ok(())
        }
    }
}
