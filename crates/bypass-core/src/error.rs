//! Error types for the bypass reconciler
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for bypass operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the bypass reconciler
#[derive(Error, Debug)]
pub enum Error {
    /// Domain store-related errors
    #[error("Domain store error: {0}")]
    DomainStore(String),

    /// Name resolution errors
    #[error("Resolver error: {0}")]
    Resolver(String),

    /// Settings applier errors
    #[error("Settings applier error ({applier}): {message}")]
    Applier {
        /// Applier name
        applier: String,
        /// Error message
        message: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a domain store error
    pub fn domain_store(msg: impl Into<String>) -> Self {
        Self::DomainStore(msg.into())
    }

    /// Create a resolver error
    pub fn resolver(msg: impl Into<String>) -> Self {
        Self::Resolver(msg.into())
    }

    /// Create a settings applier error
    pub fn applier(applier: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Applier {
            applier: applier.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
