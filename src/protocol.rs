//! Wire formats shared by the bus channels and the live feed server.
//!
//! The JSON payloads here are a stable contract: external consumers parse
//! them, and the original UI already speaks them. Raw audio is framed as
//! headerless little-endian f32 PCM.

use crate::classify::Label;
use crate::control::ControlState;
use crate::error::{AdhopError, Result};
use serde::{Deserialize, Serialize};

/// Classification result as published on the classifier channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMessage {
    /// Winning label (`song` or `ad`).
    pub label: Label,
    /// Full probability vector, ordered `[song, ad]`.
    pub probs: Vec<f32>,
}

impl ClassificationMessage {
    /// Serialize to a JSON string.
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from a JSON string.
    pub fn from_json(s: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// Control-state change as published on the state channel.
///
/// Published once per state/target change, never per label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateMessage {
    /// New control state (`primary`, `patience1`, `secondary`, `patience2`).
    pub state: ControlState,
    /// Station frequency in Hz the state targets.
    pub station: f64,
}

impl StateMessage {
    /// Serialize to a JSON string.
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from a JSON string.
    pub fn from_json(s: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// The live feeds a consumer can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feed {
    /// Raw audio batches (binary f32le PCM).
    Audio,
    /// Classification results (JSON lines).
    Classifier,
    /// Control-state changes (JSON lines).
    State,
}

impl Feed {
    /// All feeds the hub serves.
    pub const ALL: [Feed; 3] = [Feed::Audio, Feed::Classifier, Feed::State];

    /// True for feeds delivered as raw bytes rather than JSON lines.
    pub fn is_binary(&self) -> bool {
        matches!(self, Feed::Audio)
    }

    /// Human-readable feed name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Feed::Audio => "audio",
            Feed::Classifier => "classifier",
            Feed::State => "state",
        }
    }
}

impl std::fmt::Display for Feed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First line a feed consumer sends after connecting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubscribeRequest {
    pub feed: Feed,
}

impl SubscribeRequest {
    /// Serialize to a JSON string.
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from a JSON string.
    pub fn from_json(s: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// Encodes audio samples as headerless little-endian f32 PCM.
pub fn encode_samples(samples: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * 4);
    for s in samples {
        out.extend_from_slice(&s.to_le_bytes());
    }
    out
}

/// Decodes a headerless little-endian f32 PCM payload.
///
/// Rejects payloads whose length is not a multiple of 4; a truncated batch
/// is a malformed message, not a shorter one.
pub fn decode_samples(payload: &[u8]) -> Result<Vec<f32>> {
    if payload.len() % 4 != 0 {
        return Err(AdhopError::Protocol {
            message: format!(
                "audio payload length {} is not a multiple of 4",
                payload.len()
            ),
        });
    }
    Ok(payload
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_message_json_shape() {
        let msg = ClassificationMessage {
            label: Label::Ad,
            probs: vec![0.25, 0.75],
        };
        let json = msg.to_json().expect("should serialize");
        assert!(json.contains("\"label\":\"ad\""), "got: {json}");
        assert!(json.contains("\"probs\":[0.25,0.75]"), "got: {json}");
    }

    #[test]
    fn test_classification_message_roundtrip() {
        let msg = ClassificationMessage {
            label: Label::Song,
            probs: vec![0.9, 0.1],
        };
        let json = msg.to_json().expect("should serialize");
        let back = ClassificationMessage::from_json(&json).expect("should deserialize");
        assert_eq!(msg, back);
    }

    #[test]
    fn test_classification_message_rejects_unknown_label() {
        let result = ClassificationMessage::from_json("{\"label\":\"weather\",\"probs\":[1.0,0.0]}");
        assert!(result.is_err());
    }

    #[test]
    fn test_state_message_json_shape() {
        let msg = StateMessage {
            state: ControlState::PatienceFromPrimary,
            station: 100.304e6,
        };
        let json = msg.to_json().expect("should serialize");
        assert!(json.contains("\"state\":\"patience1\""), "got: {json}");
        assert!(json.contains("\"station\":"), "got: {json}");

        let back = StateMessage::from_json(&json).expect("should deserialize");
        assert_eq!(msg, back);
    }

    #[test]
    fn test_state_message_rejects_unknown_state() {
        let result = StateMessage::from_json("{\"state\":\"limbo\",\"station\":1.0}");
        assert!(result.is_err());
    }

    #[test]
    fn test_subscribe_request_roundtrip() {
        for feed in Feed::ALL {
            let req = SubscribeRequest { feed };
            let json = req.to_json().expect("should serialize");
            let back = SubscribeRequest::from_json(&json).expect("should deserialize");
            assert_eq!(req, back, "roundtrip failed for {feed}");
        }
    }

    #[test]
    fn test_subscribe_request_wire_format() {
        let req = SubscribeRequest { feed: Feed::Audio };
        assert_eq!(req.to_json().unwrap(), "{\"feed\":\"audio\"}");
    }

    #[test]
    fn test_feed_binary_flag() {
        assert!(Feed::Audio.is_binary());
        assert!(!Feed::Classifier.is_binary());
        assert!(!Feed::State.is_binary());
    }

    #[test]
    fn test_encode_samples_little_endian() {
        let bytes = encode_samples(&[1.0]);
        assert_eq!(bytes, 1.0f32.to_le_bytes());
    }

    #[test]
    fn test_decode_samples_roundtrip() {
        let samples = vec![0.0, -0.5, 0.25, 1.0];
        let decoded = decode_samples(&encode_samples(&samples)).expect("should decode");
        assert_eq!(decoded, samples);
    }

    #[test]
    fn test_decode_samples_empty() {
        assert_eq!(decode_samples(&[]).expect("empty is valid"), Vec::<f32>::new());
    }

    #[test]
    fn test_decode_samples_rejects_truncated_payload() {
        let mut bytes = encode_samples(&[1.0, 2.0]);
        bytes.pop();
        let err = decode_samples(&bytes).unwrap_err();
        assert!(err.to_string().contains("multiple of 4"));
    }
}
