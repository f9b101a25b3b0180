//! Error types for adhop.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdhopError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Audio source errors
    #[error("Audio source failed: {message}")]
    AudioSource { message: String },

    // Classification errors
    #[error("Classification failed: {message}")]
    Classification { message: String },

    #[error("Invalid classification result: {message}")]
    ClassificationInvalid { message: String },

    // Channel bus errors
    #[error("Bus error on channel {channel}: {message}")]
    Bus { channel: String, message: String },

    #[error("Bus channel {channel} closed")]
    BusClosed { channel: String },

    // Wire protocol errors
    #[error("Malformed payload: {message}")]
    Protocol { message: String },

    // Station tuner errors
    #[error("Failed to retune: {message}")]
    Tuner { message: String },

    // Fan-out hub errors
    #[error("Feed server error: {message}")]
    Hub { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, AdhopError>;
