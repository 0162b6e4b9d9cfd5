//! Error types for serene-player
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use thiserror::Error;

/// Main error type for serene-player
#[derive(Error, Debug)]
pub enum Error {
    /// Errors from the shared library (config, JSON, validation)
    #[error(transparent)]
    Common(#[from] serene_common::Error),

    /// Activity not found in the content repository
    #[error("Activity not found: {0}")]
    NotFound(String),

    /// Content repository failed to load or list activities
    #[error("Content error: {0}")]
    Content(String),

    /// Completion sink call failed
    #[error("Completion sink error: {0}")]
    Sink(String),

    /// Session task has ended; commands can no longer be delivered
    #[error("Session closed: {0}")]
    SessionClosed(String),

    /// Invalid state for operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using serene-player Error
pub type Result<T> = std::result::Result<T, Error>;
