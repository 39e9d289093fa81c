//! Error types for docgate.
//!
//! A single error enum covers configuration, I/O, provider, retrieval and
//! prompt failures. The answer pipeline turns every one of these into a
//! well-formed response; only setup code surfaces them to callers.

use thiserror::Error;

/// Unified error type for docgate.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Text-generation provider errors (transport, status, empty output, timeout)
    #[error("LLM error: {0}")]
    Llm(String),

    /// Failure computing a query or chunk embedding
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector store errors
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Prompt template errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Role string that the permission model does not know
    #[error("Invalid role: {0}")]
    InvalidRole(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
