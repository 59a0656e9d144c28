//! Error types for pgpattern.
//!
//! Compiling a pattern never fails. These errors come from the layers
//! around the compiler: target lookup and configuration.

use thiserror::Error;

/// The main error type for pgpattern operations.
#[derive(Debug, Error)]
pub enum PatternError {
    /// No built-in or configured target has this name.
    #[error("Unknown target: '{0}'. Run `pgpattern targets` to list them")]
    UnknownTarget(String),

    /// A configured target is missing something it needs.
    #[error("Invalid target '{name}': {message}")]
    InvalidTarget { name: String, message: String },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed TOML configuration.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl PatternError {
    /// Create an invalid target error.
    pub fn invalid_target(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidTarget {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for pgpattern operations.
pub type PatternResult<T> = Result<T, PatternError>;
