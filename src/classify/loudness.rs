//! Loudness-dynamics baseline classifier.
//!
//! Stands in when no trained model is attached. Ad breaks on commercial
//! radio are heavily loudness-compressed: short-term RMS barely moves.
//! Songs have wider dynamics. The classifier frames the window, measures
//! the spread of per-frame RMS around its mean, and calls low-spread,
//! non-silent windows ads.
//!
//! This is a placeholder heuristic behind the same [`Classifier`] trait a
//! real model implements; swap it out without touching the pipeline.

use crate::classify::classifier::{Classification, Classifier, Label};
use crate::error::{AdhopError, Result};

/// Configuration for the loudness classifier.
#[derive(Debug, Clone, Copy)]
pub struct LoudnessConfig {
    /// RMS frame length in samples (default: 4000, 250ms at 16kHz).
    pub frame_samples: usize,
    /// Relative RMS spread (std dev / mean) below which a window is
    /// considered compressed, i.e. an ad.
    pub flatness_threshold: f32,
    /// Mean RMS below which a window is treated as dead air and labelled
    /// song (never hop on silence).
    pub silence_floor: f32,
}

impl Default for LoudnessConfig {
    fn default() -> Self {
        Self {
            frame_samples: 4000,
            flatness_threshold: 0.25,
            silence_floor: 1e-4,
        }
    }
}

/// Baseline classifier keyed on loudness dynamics.
#[derive(Debug, Clone, Default)]
pub struct LoudnessClassifier {
    config: LoudnessConfig,
}

impl LoudnessClassifier {
    /// Creates a classifier with default tuning.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a classifier with custom tuning.
    pub fn with_config(config: LoudnessConfig) -> Self {
        Self { config }
    }

    /// Relative spread of per-frame RMS for a window, or `None` when the
    /// window is effectively silent.
    fn rms_spread(&self, window: &[f32]) -> Option<f32> {
        let frames: Vec<f32> = window
            .chunks(self.config.frame_samples)
            .filter(|c| !c.is_empty())
            .map(calculate_rms)
            .collect();

        let mean = frames.iter().sum::<f32>() / frames.len() as f32;
        if mean < self.config.silence_floor {
            return None;
        }

        let variance =
            frames.iter().map(|r| (r - mean).powi(2)).sum::<f32>() / frames.len() as f32;
        Some(variance.sqrt() / mean)
    }
}

impl Classifier for LoudnessClassifier {
    fn classify(&self, window: &[f32]) -> Result<Classification> {
        if window.is_empty() {
            return Err(AdhopError::Classification {
                message: "empty window".to_string(),
            });
        }

        let (label, ad_prob) = match self.rms_spread(window) {
            None => (Label::Song, 0.0),
            Some(spread) => {
                // Map spread onto an ad probability: 0 spread → certain ad,
                // at the threshold → 0.5, well above → song.
                let ratio = spread / self.config.flatness_threshold;
                let ad_prob = (1.0 / (1.0 + ratio * ratio)).clamp(0.0, 1.0);
                let label = if ad_prob > 0.5 { Label::Ad } else { Label::Song };
                (label, ad_prob)
            }
        };

        Ok(Classification {
            label,
            probs: vec![1.0 - ad_prob, ad_prob],
        })
    }

    fn model_name(&self) -> &str {
        "loudness-baseline"
    }

    fn is_ready(&self) -> bool {
        true
    }
}

/// Root-mean-square level of a sample slice, 0.0 to 1.0.
fn calculate_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}
