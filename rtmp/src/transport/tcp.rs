use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

use native_tls::{HandshakeError, TlsConnector, TlsStream};

use transport::{Transport, TransportError};

const READ_BUFFER_SIZE: usize = 4096;

enum Stream {
    Plain(TcpStream),
    Tls(TlsStream<TcpStream>),
}

/// A transport over a direct TCP connection, optionally wrapped in TLS.
///
/// The socket carries a read timeout so `service()` returns with an empty result when
/// the server has nothing to say, instead of blocking forever.
pub struct TcpTransport {
    stream: Stream,
    out_buffer: Vec<u8>,
    bytes_in: u64,
    bytes_out: u64,
}

impl TcpTransport {
    /// Connects to the specified host and port.  When `use_tls` is set the stream is
    /// wrapped in TLS with the host name used for certificate validation.
    pub fn connect(
        host: &str,
        port: u16,
        use_tls: bool,
        read_timeout: Duration,
    ) -> Result<TcpTransport, TransportError> {
        let tcp_stream = TcpStream::connect((host, port))?;
        tcp_stream.set_read_timeout(Some(read_timeout))?;
        tcp_stream.set_nodelay(true)?;

        let stream = if use_tls {
            let connector = TlsConnector::new()
                .map_err(|error| TransportError::TlsHandshakeFailed(error.to_string()))?;

            let tls_stream = connector.connect(host, tcp_stream).map_err(|error| {
                let message = match error {
                    HandshakeError::Failure(error) => error.to_string(),
                    HandshakeError::WouldBlock(_) => "handshake interrupted".to_string(),
                };

                TransportError::TlsHandshakeFailed(message)
            })?;

            Stream::Tls(tls_stream)
        } else {
            Stream::Plain(tcp_stream)
        };

        debug!(host, port, tls = use_tls, "Socket connected");

        Ok(TcpTransport {
            stream,
            out_buffer: Vec::new(),
            bytes_in: 0,
            bytes_out: 0,
        })
    }

    fn flush_output(&mut self) -> Result<(), TransportError> {
        if self.out_buffer.is_empty() {
            return Ok(());
        }

        match self.stream {
            Stream::Plain(ref mut stream) => stream.write_all(&self.out_buffer)?,
            Stream::Tls(ref mut stream) => stream.write_all(&self.out_buffer)?,
        }

        self.bytes_out += self.out_buffer.len() as u64;
        self.out_buffer.clear();
        Ok(())
    }
}

impl Transport for TcpTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.out_buffer.extend_from_slice(bytes);
        Ok(())
    }

    fn service(&mut self) -> Result<Vec<u8>, TransportError> {
        self.flush_output()?;

        let mut buffer = [0_u8; READ_BUFFER_SIZE];
        let result = match self.stream {
            Stream::Plain(ref mut stream) => stream.read(&mut buffer),
            Stream::Tls(ref mut stream) => stream.read(&mut buffer),
        };

        match result {
            Ok(0) => Err(TransportError::ConnectionClosed),
            Ok(read) => {
                self.bytes_in += read as u64;
                Ok(buffer[..read].to_vec())
            }

            // A timed out read just means the server had nothing to send
            Err(ref error)
                if error.kind() == ErrorKind::WouldBlock || error.kind() == ErrorKind::TimedOut =>
            {
                Ok(Vec::new())
            }

            Err(error) => Err(TransportError::Io(error)),
        }
    }

    fn close(&mut self) -> Result<(), TransportError> {
        let _ = self.flush_output();

        let tcp_stream = match self.stream {
            Stream::Plain(ref stream) => stream,
            Stream::Tls(ref stream) => stream.get_ref(),
        };

        tcp_stream.shutdown(Shutdown::Both)?;
        Ok(())
    }

    fn bytes_in(&self) -> u64 {
        self.bytes_in
    }

    fn bytes_out(&self) -> u64 {
        self.bytes_out
    }

    fn pending_out(&self) -> usize {
        self.out_buffer.len()
    }
}
