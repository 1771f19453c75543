//! Error types for mediascribe.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MediascribeError {
    // Configuration errors
    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Model lifecycle errors
    #[error("Model artifact not found at {path}")]
    ModelNotFound { path: String },

    #[error("Another model load is already in progress")]
    ModelLoadInProgress,

    #[error("Failed to load model {model}: {message}")]
    ModelLoad { model: String, message: String },

    // Recognition errors
    #[error("Inference failed: {message}")]
    Inference { message: String },

    // Preprocessing errors
    #[error("Vocal separation failed: {message}")]
    Separation { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, MediascribeError>;
