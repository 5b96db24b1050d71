//! Error types for vocast.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VocastError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Request validation — rejected before any job or voice record exists
    #[error("{message}")]
    Validation { field: String, message: String },

    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    // External call failures; terminal to the owning job
    #[error("Speech synthesis failed: {message}")]
    Synthesis { message: String },

    #[error("Audio processing failed: {message}")]
    Processing { message: String },

    // Artifact requested before the job produced one
    #[error("{message}")]
    Conflict { message: String },

    // Voice store errors
    #[error("Voice store error: {message}")]
    Storage { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

impl VocastError {
    /// Shorthand for a validation failure on a named request field.
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Shorthand for a missing resource.
    pub fn not_found(resource: &str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.to_string(),
            id: id.into(),
        }
    }
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, VocastError>;
