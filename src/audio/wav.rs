//! WAV file audio source for replay mode.
//!
//! Lets the pipeline run against recorded radio instead of a live receiver.

use crate::audio::source::AudioSource;
use crate::error::{AdhopError, Result};
use std::io::Read;
use std::path::Path;

/// Audio source that replays WAV file data as f32 batches.
/// Supports arbitrary sample rates and channels, resampling to the target rate.
pub struct WavAudioSource {
    samples: Vec<f32>,
    position: usize,
    chunk_size: usize,
    looping: bool,
}

impl WavAudioSource {
    /// Create from any reader (for testing/flexibility).
    pub fn from_reader(reader: Box<dyn Read + Send>, target_rate: u32) -> Result<Self> {
        let mut wav_reader = hound::WavReader::new(reader).map_err(|e| AdhopError::AudioSource {
            message: format!("Failed to parse WAV file: {}", e),
        })?;

        let spec = wav_reader.spec();
        let source_rate = spec.sample_rate;
        let source_channels = spec.channels;

        // Read all samples as f32 in [-1, 1], whatever the stored format.
        let raw_samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => wav_reader
                .samples::<f32>()
                .collect::<std::result::Result<Vec<_>, _>>(),
            hound::SampleFormat::Int => wav_reader
                .samples::<i16>()
                .map(|s| s.map(|v| v as f32 / i16::MAX as f32))
                .collect::<std::result::Result<Vec<_>, _>>(),
        }
        .map_err(|e| AdhopError::AudioSource {
            message: format!("Failed to read WAV samples: {}", e),
        })?;

        // Convert to mono if stereo
        let mono_samples = if source_channels == 2 {
            raw_samples
                .chunks_exact(2)
                .map(|chunk| (chunk[0] + chunk[1]) / 2.0)
                .collect()
        } else {
            raw_samples
        };

        // Resample to the target rate if needed
        let samples = if source_rate != target_rate {
            resample(&mono_samples, source_rate, target_rate)
        } else {
            mono_samples
        };

        // 100ms reads at the target rate
        let chunk_size = (target_rate / 10) as usize;

        Ok(Self {
            samples,
            position: 0,
            chunk_size,
            looping: false,
        })
    }

    /// Create from a file on disk.
    pub fn from_path(path: &Path, target_rate: u32) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_reader(Box::new(std::io::Cursor::new(data)), target_rate)
    }

    /// Replay the file forever instead of ending after one pass.
    pub fn looping(mut self) -> Self {
        self.looping = true;
        self
    }

    /// Total number of samples after mixdown and resampling.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when the file decoded to no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl AudioSource for WavAudioSource {
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_samples(&mut self) -> Result<Vec<f32>> {
        if self.position >= self.samples.len() {
            if self.looping && !self.samples.is_empty() {
                self.position = 0;
            } else {
                return Ok(Vec::new());
            }
        }

        let end = std::cmp::min(self.position + self.chunk_size, self.samples.len());
        let chunk = self.samples[self.position..end].to_vec();
        self.position = end;

        Ok(chunk)
    }

    fn is_finite(&self) -> bool {
        !self.looping
    }
}

/// Simple linear interpolation resampling.
fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = source_pos.floor() as usize;
            let fraction = source_pos - source_idx as f64;

            if source_idx + 1 >= samples.len() {
                samples[source_idx]
            } else {
                let left = samples[source_idx] as f64;
                let right = samples[source_idx + 1] as f64;
                (left + (right - left) * fraction) as f32
            }
        })
        .collect()
}
