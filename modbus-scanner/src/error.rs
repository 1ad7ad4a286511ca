//! Error types for the scanner.

use thiserror::Error;

/// Result type alias using [`ScanError`].
pub type Result<T> = std::result::Result<T, ScanError>;

/// Errors that abort a scan run.
///
/// Configuration problems surface earlier, as
/// [`ConfigError`](crate::config::ConfigError). Per-block read failures are
/// not represented here; they are recorded as failed block results and the
/// scan carries on.
#[derive(Error, Debug)]
pub enum ScanError {
    /// The device could not be reached at scan start.
    #[error("Unable to connect to {addr}: {message}")]
    Connection { addr: String, message: String },

    /// The report sink could not be opened or written.
    #[error("Report output error: {0}")]
    Output(#[from] std::io::Error),

    /// A report event could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ScanError {
    /// Create a connection error.
    pub fn connection(addr: impl ToString, message: impl Into<String>) -> Self {
        Self::Connection {
            addr: addr.to_string(),
            message: message.into(),
        }
    }
}
