use crate::error::{AdhopError, Result};

/// Trait for the demodulated-audio source.
///
/// This trait allows swapping implementations (an SDR front end, a WAV
/// replay, a mock). The receiver chain itself lives behind this seam; the
/// pipeline only sees mono f32 samples at a fixed rate.
pub trait AudioSource: Send {
    /// Start producing audio.
    fn start(&mut self) -> Result<()>;

    /// Stop producing audio.
    fn stop(&mut self) -> Result<()>;

    /// Read whatever samples are currently available.
    ///
    /// An empty vector means "nothing yet" for a live source and
    /// "exhausted" for a finite one.
    fn read_samples(&mut self) -> Result<Vec<f32>>;

    /// True when the source ends on its own (file replay); false for live
    /// sources, where an empty read just means "poll again".
    fn is_finite(&self) -> bool {
        false
    }
}

/// Mock audio source for testing.
#[derive(Debug, Clone)]
pub struct MockAudioSource {
    is_started: bool,
    reads: Vec<Vec<f32>>,
    position: usize,
    finite: bool,
    should_fail_start: bool,
    should_fail_read: bool,
    error_message: String,
}

impl MockAudioSource {
    /// Create a new mock audio source with no scripted reads.
    pub fn new() -> Self {
        Self {
            is_started: false,
            reads: Vec::new(),
            position: 0,
            finite: true,
            should_fail_start: false,
            should_fail_read: false,
            error_message: "mock audio error".to_string(),
        }
    }

    /// Configure the reads the mock returns, in order. Once exhausted, the
    /// mock returns empty reads.
    pub fn with_reads(mut self, reads: Vec<Vec<f32>>) -> Self {
        self.reads = reads;
        self
    }

    /// Mark the mock as a live source (empty reads mean "poll again").
    pub fn as_live_source(mut self) -> Self {
        self.finite = false;
        self
    }

    /// Configure the mock to fail on start.
    pub fn with_start_failure(mut self) -> Self {
        self.should_fail_start = true;
        self
    }

    /// Configure the mock to fail on read.
    pub fn with_read_failure(mut self) -> Self {
        self.should_fail_read = true;
        self
    }

    /// Check if the audio source is started.
    pub fn is_started(&self) -> bool {
        self.is_started
    }
}

impl Default for MockAudioSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSource for MockAudioSource {
    fn start(&mut self) -> Result<()> {
        if self.should_fail_start {
            return Err(AdhopError::AudioSource {
                message: self.error_message.clone(),
            });
        }
        self.is_started = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.is_started = false;
        Ok(())
    }

    fn read_samples(&mut self) -> Result<Vec<f32>> {
        if self.should_fail_read {
            return Err(AdhopError::AudioSource {
                message: self.error_message.clone(),
            });
        }
        if self.position >= self.reads.len() {
            return Ok(Vec::new());
        }
        let read = self.reads[self.position].clone();
        self.position += 1;
        Ok(read)
    }

    fn is_finite(&self) -> bool {
        self.finite
    }
}
