//! Error types for the label printer library

use thiserror::Error;

/// Label printer error types
#[derive(Debug, Error)]
pub enum LabelError {
    /// A label was built without a barcode value
    #[error("Barcode must not be empty")]
    EmptyBarcode,

    /// Label geometry is not usable as given
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Network connection error
    #[error("Connection failed: {0}")]
    Connection(String),

    /// IO error during printing
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Timeout waiting for printer
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Printer is offline or unreachable
    #[error("Printer offline: {0}")]
    Offline(String),
}

/// Result type for label operations
pub type LabelResult<T> = Result<T, LabelError>;
