//! Protocol error types.

use thiserror::Error;

/// Errors that can occur while decoding or encoding wire frames.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed binary frame: {0}")]
    Binary(#[from] rmp_serde::decode::Error),

    #[error("malformed text frame: {0}")]
    Text(#[from] serde_json::Error),

    #[error("failed to encode command: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("empty frame")]
    EmptyFrame,
}
