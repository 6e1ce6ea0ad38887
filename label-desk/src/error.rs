//! Error types

use thiserror::Error;
use tspl_printer::LabelError;

/// Failures at the print bridge boundary
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Bridge adapter could not be loaded (client app not installed)
    #[error("Bridge unavailable: {0}")]
    Unavailable(String),

    /// Transport never opened within the retry policy
    #[error("Connection timeout: {0}")]
    ConnectionTimeout(String),

    /// Bridge rejected a print job
    #[error("Job rejected by bridge: {0}")]
    Dispatch(String),

    /// Transport level fault reported by the bridge
    #[error("Transport error: {0}")]
    Transport(String),

    /// Label content or geometry error
    #[error(transparent)]
    Label(#[from] LabelError),
}

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Print queue errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    /// Queue is locked by an in-flight print
    #[error("A print job is in progress")]
    Busy,
}
