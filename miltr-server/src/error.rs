//! Server error types.

use thiserror::Error;

/// Errors that terminate a milter connection.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] miltr_protocol::ProtocolError),
}
