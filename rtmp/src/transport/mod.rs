/*!
This module contains the network transports that carry RTMP bytes to and from a server.

Two transports exist: a direct TCP socket (optionally wrapped in TLS for `rtmps`) and
an HTTP tunneled variant for `rtmpt`.  Both expose the same contract, so the layers
above never know which one is underneath: `write()` queues outgoing bytes, `service()`
performs one bounded round of network work and returns whatever inbound bytes arrived.
*/

mod rtmpt;
mod tcp;

pub use self::rtmpt::RtmptTransport;
pub use self::tcp::TcpTransport;

use std::io;
use thiserror::Error;

/// An enumeration of errors that can occur while moving bytes to or from the server
#[derive(Debug, Error)]
pub enum TransportError {
    /// Encountered when an error occurs on the underlying socket
    #[error("An i/o error occurred on the transport: {0}")]
    Io(#[from] io::Error),

    /// Encountered when setting up TLS for an rtmps connection fails
    #[error("The TLS handshake with the server failed: {0}")]
    TlsHandshakeFailed(String),

    /// Encountered when an rtmpt server sends an HTTP response we cannot make sense of
    #[error("The server sent a malformed tunnel response")]
    MalformedTunnelResponse,

    /// Encountered when the server closed the connection
    #[error("The connection was closed by the server")]
    ConnectionClosed,
}

/// The contract every transport implements.
///
/// Transports are serviced from a single thread.  Every operation is bounded: reads are
/// limited by the socket read timeout, so `service()` never blocks indefinitely.
pub trait Transport {
    /// Queues bytes for delivery to the server.  Bytes are handed to the network on the
    /// next `service()` call, preserving write order.
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Performs one round of network work: flushes queued outgoing bytes and reads any
    /// input the server has sent.  Returns the inbound bytes (empty when nothing
    /// arrived within the transport's timing bounds).
    fn service(&mut self) -> Result<Vec<u8>, TransportError>;

    /// Closes the transport.  Further calls will fail.
    fn close(&mut self) -> Result<(), TransportError>;

    /// Total number of protocol bytes received from the server
    fn bytes_in(&self) -> u64;

    /// Total number of protocol bytes handed to the network
    fn bytes_out(&self) -> u64;

    /// Number of queued outgoing bytes that have not been handed to the network yet
    fn pending_out(&self) -> usize;
}
