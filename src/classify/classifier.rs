use crate::defaults;
use crate::error::{AdhopError, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Content categories a window of radio audio can be classified as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    /// Regular programming (music).
    Song,
    /// An ad break.
    Ad,
}

impl Label {
    /// Number of known labels; probability vectors must have this length.
    pub const COUNT: usize = 2;

    /// The wire name of this label, as it appears in classifier messages.
    pub fn as_wire(&self) -> &'static str {
        match self {
            Label::Song => "song",
            Label::Ad => "ad",
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Result of classifying one window: the winning label and the full
/// probability vector, ordered `[song, ad]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: Label,
    pub probs: Vec<f32>,
}

impl Classification {
    /// Checks that this result is well-formed before it is published.
    ///
    /// The probability vector must have one entry per known label, contain
    /// only finite non-negative values, and sum to 1 within tolerance.
    pub fn validate(&self) -> Result<()> {
        if self.probs.len() != Label::COUNT {
            return Err(AdhopError::ClassificationInvalid {
                message: format!(
                    "expected {} probabilities, got {}",
                    Label::COUNT,
                    self.probs.len()
                ),
            });
        }
        if self.probs.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(AdhopError::ClassificationInvalid {
                message: format!("probabilities must be finite and non-negative: {:?}", self.probs),
            });
        }
        let sum: f32 = self.probs.iter().sum();
        if (sum - 1.0).abs() > defaults::PROB_SUM_TOLERANCE {
            return Err(AdhopError::ClassificationInvalid {
                message: format!("probabilities sum to {sum}, expected 1"),
            });
        }
        Ok(())
    }
}

/// Trait for the window classification oracle.
///
/// This trait allows swapping implementations (a real model vs a mock).
/// `classify` is expected to block noticeably; callers run it on a
/// blocking thread pool.
pub trait Classifier: Send + Sync {
    /// Classify one complete window of audio samples.
    fn classify(&self, window: &[f32]) -> Result<Classification>;

    /// Get the name of the loaded model
    fn model_name(&self) -> &str;

    /// Check if the classifier is ready
    fn is_ready(&self) -> bool;
}

/// Mock classifier for testing.
///
/// Returns labels from a script in order, repeating the last entry once the
/// script is exhausted.
pub struct MockClassifier {
    model_name: String,
    script: Mutex<VecDeque<Label>>,
    fallback: Label,
    should_fail: bool,
    probs_override: Option<Vec<f32>>,
}

impl MockClassifier {
    /// Create a new mock classifier that always returns `Song`.
    pub fn new(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            script: Mutex::new(VecDeque::new()),
            fallback: Label::Song,
            should_fail: false,
            probs_override: None,
        }
    }

    /// Configure the mock to return the given labels in order.
    pub fn with_script(self, labels: impl IntoIterator<Item = Label>) -> Self {
        {
            let mut script = self.script.lock().unwrap();
            script.clear();
            script.extend(labels);
        }
        self
    }

    /// Configure the label returned once the script is exhausted.
    pub fn with_fallback(mut self, label: Label) -> Self {
        self.fallback = label;
        self
    }

    /// Configure the mock to fail on classify.
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Configure the mock to return a specific probability vector,
    /// e.g. one that does not sum to 1, for validation tests.
    pub fn with_probs(mut self, probs: Vec<f32>) -> Self {
        self.probs_override = Some(probs);
        self
    }
}

impl Classifier for MockClassifier {
    fn classify(&self, _window: &[f32]) -> Result<Classification> {
        if self.should_fail {
            return Err(AdhopError::Classification {
                message: "mock classification failure".to_string(),
            });
        }

        let label = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback);

        let probs = match &self.probs_override {
            Some(p) => p.clone(),
            None => match label {
                Label::Song => vec![0.9, 0.1],
                Label::Ad => vec![0.1, 0.9],
            },
        };

        Ok(Classification { label, probs })
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        !self.should_fail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_wire_names() {
        assert_eq!(Label::Song.as_wire(), "song");
        assert_eq!(Label::Ad.as_wire(), "ad");
        assert_eq!(Label::Ad.to_string(), "ad");
    }

    #[test]
    fn test_label_serde_roundtrip() {
        let json = serde_json::to_string(&Label::Ad).unwrap();
        assert_eq!(json, "\"ad\"");
        let back: Label = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Label::Ad);
    }

    #[test]
    fn test_label_unknown_wire_name_rejected() {
        let result: std::result::Result<Label, _> = serde_json::from_str("\"news\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_accepts_well_formed_result() {
        let c = Classification {
            label: Label::Song,
            probs: vec![0.7, 0.3],
        };
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_validate_accepts_sum_within_tolerance() {
        let c = Classification {
            label: Label::Ad,
            probs: vec![0.4995, 0.5],
        };
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_sum() {
        let c = Classification {
            label: Label::Song,
            probs: vec![0.7, 0.7],
        };
        let err = c.validate().unwrap_err();
        assert!(err.to_string().contains("sum"));
    }

    #[test]
    fn test_validate_rejects_wrong_length() {
        let c = Classification {
            label: Label::Song,
            probs: vec![1.0],
        };
        assert!(c.validate().is_err());

        let c = Classification {
            label: Label::Song,
            probs: vec![0.3, 0.3, 0.4],
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_nan_and_negative() {
        let c = Classification {
            label: Label::Song,
            probs: vec![f32::NAN, 1.0],
        };
        assert!(c.validate().is_err());

        let c = Classification {
            label: Label::Song,
            probs: vec![-0.2, 1.2],
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_mock_classifier_follows_script() {
        let mock = MockClassifier::new("mock").with_script([Label::Ad, Label::Song]);

        assert_eq!(mock.classify(&[]).unwrap().label, Label::Ad);
        assert_eq!(mock.classify(&[]).unwrap().label, Label::Song);
        // Script exhausted: fallback
        assert_eq!(mock.classify(&[]).unwrap().label, Label::Song);
    }

    #[test]
    fn test_mock_classifier_fallback() {
        let mock = MockClassifier::new("mock").with_fallback(Label::Ad);
        assert_eq!(mock.classify(&[]).unwrap().label, Label::Ad);
    }

    #[test]
    fn test_mock_classifier_failure() {
        let mock = MockClassifier::new("mock").with_failure();
        assert!(!mock.is_ready());
        assert!(mock.classify(&[]).is_err());
    }

    #[test]
    fn test_mock_classifier_probs_follow_label() {
        let mock = MockClassifier::new("mock").with_script([Label::Ad]);
        let c = mock.classify(&[]).unwrap();
        assert!(c.probs[1] > c.probs[0]);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_classifier_trait_is_object_safe() {
        let classifier: Box<dyn Classifier> = Box::new(MockClassifier::new("boxed"));
        assert_eq!(classifier.model_name(), "boxed");
        assert!(classifier.is_ready());
    }
}
