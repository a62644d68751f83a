//! Server error types.

use roster_core::CodecError;
use thiserror::Error;

/// A frame could not be handed to a session's writer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The outbound queue is full; the client is not keeping up.
    #[error("outbound queue full")]
    QueueFull,
    /// The session's transport has closed.
    #[error("session closed")]
    Closed,
}

/// A broadcast could not be performed at all.
#[derive(Debug, Error)]
pub enum HubError {
    /// The message could not be encoded, so nobody received it.
    #[error(transparent)]
    Encode(#[from] CodecError),
}
