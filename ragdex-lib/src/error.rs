//! Error types for RAGDEX

use thiserror::Error;

/// Result type alias for RAGDEX operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in RAGDEX operations
#[derive(Error, Debug)]
pub enum Error {
    /// Unrecognized response mode; never substituted with a default
    #[error("unrecognized response mode: {0}")]
    InvalidStrategy(String),

    /// Embedding or language-model backend failure (auth, network, quota)
    #[error("backend error: {0}")]
    Backend(String),

    /// Vector store failure or missing persisted index
    #[error("retrieval error: {0}")]
    Retrieval(String),

    /// Failed to load or parse configuration
    #[error("config error: {0}")]
    Config(String),

    /// Query aborted via its cancel token before completion
    #[error("query cancelled")]
    Cancelled,
}
