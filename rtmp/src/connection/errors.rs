use thiserror::Error;

use handshake::HandshakeError;
use sessions::ClientSessionError;
use transport::TransportError;
use uri::UriParseError;

/// An enumeration of errors that can occur while driving a connection
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Encountered when the supplied url cannot be parsed
    #[error("Invalid url: {0}")]
    InvalidUri(#[from] UriParseError),

    /// Encountered when the transport underneath the connection fails
    #[error("Transport failure: {0}")]
    TransportFailure(#[from] TransportError),

    /// Encountered when the server sends invalid handshake bytes
    #[error("Handshake failure: {0}")]
    HandshakeFailure(#[from] HandshakeError),

    /// Encountered when the server did not complete the handshake in time
    #[error("The handshake did not complete within the configured timeout")]
    HandshakeTimedOut,

    /// Encountered when the client session rejects an operation or cannot make sense
    /// of the server's messages
    #[error("Session failure: {0}")]
    SessionFailure(#[from] ClientSessionError),

    /// Encountered when an operation is attempted on a connection that has already
    /// been closed
    #[error("The connection has been closed")]
    ConnectionClosed,
}
