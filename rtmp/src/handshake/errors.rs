use std::io;
use thiserror::Error;

/// Errors that can occur while performing an RTMP handshake
#[derive(Debug, Error)]
pub enum HandshakeError {
    /// The first byte the peer sent was not the expected version of 3
    #[error("First byte of the handshake was not a 3")]
    BadVersionId,

    /// The echo packet the peer sent back did not contain our time value
    #[error("Peer did not send the correct time back")]
    IncorrectPeerTime,

    /// The echo packet the peer sent back did not contain our random data
    #[error("Peer did not send the correct random data back")]
    IncorrectRandomData,

    /// Bytes were given to a handshake that has already concluded
    #[error("Handshake has already been completed")]
    HandshakeAlreadyCompleted,

    /// An I/O error occurred while reading or building handshake packets
    #[error("{0}")]
    Io(#[from] io::Error),
}
