//! Error types and result handling
//!
//! Defines all error types that can occur in the logging library.
//! Uses thiserror for ergonomic error handling.

use std::io;
use thiserror::Error;

/// Result type alias using `ScrivenerError`.
pub type Result<T> = std::result::Result<T, ScrivenerError>;

/// Main error type for the logging library.
///
/// Covers configuration errors (unparsable rotation/retention/compression
/// specs, invalid sink arguments), sink I/O errors, and format errors.
#[derive(Error, Debug)]
pub enum ScrivenerError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    #[error("Handler not found: {0}")]
    HandlerNotFound(usize),

    #[error("Invalid format string: {0}")]
    InvalidFormat(String),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Invalid TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("{0}")]
    Custom(String),
}

impl ScrivenerError {
    pub fn config(message: impl Into<String>) -> Self {
        ScrivenerError::Config(message.into())
    }
}
