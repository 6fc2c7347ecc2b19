use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};
use std::str;
use std::time::{Duration, Instant};

use transport::{Transport, TransportError};

const CONTENT_TYPE: &str = "application/x-fcs";
const USER_AGENT: &str = "Shockwave Flash";
const READ_BUFFER_SIZE: usize = 4096;

/// A transport that tunnels RTMP over sequential HTTP POST requests (RTMPT).
///
/// HTTP has no persistent byte stream, so a virtual one is layered over a fixed
/// request protocol: `/open/1` establishes a session id, `/idle/{sid}/{seq}` polls for
/// inbound bytes, `/send/{sid}/{seq}` delivers outbound bytes, and `/close/{sid}` ends
/// the session.  Every response's first byte is a server advised poll delay; the
/// remainder is raw tunneled protocol bytes.
///
/// Outgoing bytes queue up between requests and are flushed as one send body, which
/// keeps their ordering without needing one request per write.
pub struct RtmptTransport {
    stream: TcpStream,
    host_header: String,
    session_id: String,
    request_counter: u64,
    out_buffer: Vec<u8>,
    poll_delay: u8,
    last_response: Instant,
    bytes_in: u64,
    bytes_out: u64,
}

impl RtmptTransport {
    /// Connects to the specified host and port and runs the tunnel open sequence.  Once
    /// this returns the virtual byte stream is established and handshake bytes can flow.
    pub fn connect(
        host: &str,
        port: u16,
        read_timeout: Duration,
    ) -> Result<RtmptTransport, TransportError> {
        let stream = TcpStream::connect((host, port))?;
        stream.set_read_timeout(Some(read_timeout))?;
        stream.set_nodelay(true)?;

        let mut transport = RtmptTransport {
            stream,
            host_header: format!("{}:{}", host, port),
            session_id: String::new(),
            request_counter: 0,
            out_buffer: Vec::new(),
            poll_delay: 0,
            last_response: Instant::now(),
            bytes_in: 0,
            bytes_out: 0,
        };

        // Some servers don't implement the ident endpoint, so failures are tolerated
        let _ = transport.execute_request("/fcs/ident2", &[0]);

        let open_response = transport.execute_request("/open/1", &[0])?;
        let session_id = str::from_utf8(&open_response)
            .map_err(|_| TransportError::MalformedTunnelResponse)?
            .trim()
            .to_string();

        if session_id.is_empty() {
            return Err(TransportError::MalformedTunnelResponse);
        }

        transport.session_id = session_id;

        let path = format!("/idle/{}/0", transport.session_id);
        let body = transport.execute_request(&path, &[0])?;
        let _ = transport.take_tunneled_bytes(body);

        debug!(session_id = %transport.session_id, "Tunnel session opened");
        Ok(transport)
    }

    fn execute_request(&mut self, path: &str, body: &[u8]) -> Result<Vec<u8>, TransportError> {
        let request = build_request(&self.host_header, path, body);
        self.stream.write_all(&request)?;
        read_response(&mut self.stream)
    }

    // Splits off the poll delay byte and accounts for the tunneled remainder
    fn take_tunneled_bytes(&mut self, mut body: Vec<u8>) -> Vec<u8> {
        self.last_response = Instant::now();
        if body.is_empty() {
            return body;
        }

        self.poll_delay = body.remove(0);
        self.bytes_in += body.len() as u64;
        body
    }

    fn next_sequence_number(&mut self) -> u64 {
        self.request_counter += 1;
        self.request_counter
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_delay as u64 * 1000 / 60)
    }
}

impl Transport for RtmptTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.out_buffer.extend_from_slice(bytes);
        Ok(())
    }

    fn service(&mut self) -> Result<Vec<u8>, TransportError> {
        if !self.out_buffer.is_empty() {
            let body = std::mem::replace(&mut self.out_buffer, Vec::new());
            let sequence_number = self.next_sequence_number();
            let path = format!("/send/{}/{}", self.session_id, sequence_number);
            let response = self.execute_request(&path, &body)?;
            self.bytes_out += body.len() as u64;
            return Ok(self.take_tunneled_bytes(response));
        }

        if self.last_response.elapsed() < self.poll_interval() {
            return Ok(Vec::new());
        }

        let sequence_number = self.next_sequence_number();
        let path = format!("/idle/{}/{}", self.session_id, sequence_number);
        let response = self.execute_request(&path, &[0])?;
        Ok(self.take_tunneled_bytes(response))
    }

    fn close(&mut self) -> Result<(), TransportError> {
        let path = format!("/close/{}", self.session_id);
        let _ = self.execute_request(&path, &[]);
        self.stream.shutdown(Shutdown::Both)?;

        debug!(session_id = %self.session_id, "Tunnel session closed");
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

fn build_request(host: &str, path: &str, body: &[u8]) -> Vec<u8> {
    let head = format!(
        "POST {} HTTP/1.1\r\n\
         Host: {}\r\n\
         Content-Type: {}\r\n\
         User-Agent: {}\r\n\
         Content-Length: {}\r\n\
         Connection: keep-alive\r\n\
         \r\n",
        path,
        host,
        CONTENT_TYPE,
        USER_AGENT,
        body.len(),
    );

    let mut request = head.into_bytes();
    request.extend_from_slice(body);
    request
}

fn read_response(stream: &mut TcpStream) -> Result<Vec<u8>, TransportError> {
    let mut buffer = Vec::new();
    let mut chunk = [0_u8; READ_BUFFER_SIZE];

    let header_end = loop {
        if let Some(position) = find_header_end(&buffer) {
            break position;
        }

        let read = stream.read(&mut chunk)?;
        if read == 0 {
            return Err(TransportError::ConnectionClosed);
        }

        buffer.extend_from_slice(&chunk[..read]);
    };

    let head =
        str::from_utf8(&buffer[..header_end]).map_err(|_| TransportError::MalformedTunnelResponse)?;
    let content_length = parse_response_head(head)?;

    let mut body = buffer[header_end + 4..].to_vec();
    while body.len() < content_length {
        let read = stream.read(&mut chunk)?;
        if read == 0 {
            return Err(TransportError::ConnectionClosed);
        }

        body.extend_from_slice(&chunk[..read]);
    }

    body.truncate(content_length);
    Ok(body)
}

fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|window| window == b"\r\n\r\n")
}

fn parse_response_head(head: &str) -> Result<usize, TransportError> {
    let mut lines = head.split("\r\n");
    let status_line = lines.next().ok_or(TransportError::MalformedTunnelResponse)?;
    let mut status_parts = status_line.split_whitespace();
    let _version = status_parts
        .next()
        .ok_or(TransportError::MalformedTunnelResponse)?;
    let status_code = status_parts
        .next()
        .ok_or(TransportError::MalformedTunnelResponse)?;

    if status_code != "200" {
        return Err(TransportError::MalformedTunnelResponse);
    }

    for line in lines {
        let mut parts = line.splitn(2, ':');
        let name = match parts.next() {
            Some(x) => x.trim(),
            None => continue,
        };

        if name.eq_ignore_ascii_case("content-length") {
            let value = parts.next().ok_or(TransportError::MalformedTunnelResponse)?;
            return value
                .trim()
                .parse::<usize>()
                .map_err(|_| TransportError::MalformedTunnelResponse);
        }
    }

    // No content length means no body
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_carry_the_tunnel_headers() {
        let request = build_request("server.com:80", "/open/1", &[0]);
        let text = str::from_utf8(&request[..request.len() - 1]).unwrap();

        assert!(
            text.starts_with("POST /open/1 HTTP/1.1\r\n"),
            "Unexpected request line in: {}",
            text
        );
        assert!(
            text.contains("Content-Type: application/x-fcs\r\n"),
            "Missing content type in: {}",
            text
        );
        assert!(
            text.contains("User-Agent: Shockwave Flash\r\n"),
            "Missing user agent in: {}",
            text
        );
        assert!(
            text.contains("Content-Length: 1\r\n"),
            "Missing content length in: {}",
            text
        );
        assert_eq!(request[request.len() - 1], 0, "Missing body byte");
    }

    #[test]
    fn response_head_parsing_returns_content_length() {
        let head = "HTTP/1.1 200 OK\r\nContent-Type: application/x-fcs\r\nContent-Length: 42";
        assert_eq!(parse_response_head(head).unwrap(), 42, "Unexpected length");
    }

    #[test]
    fn response_head_without_content_length_means_empty_body() {
        let head = "HTTP/1.1 200 OK\r\nContent-Type: application/x-fcs";
        assert_eq!(parse_response_head(head).unwrap(), 0, "Unexpected length");
    }

    #[test]
    fn non_success_status_is_rejected() {
        let head = "HTTP/1.1 404 Not Found\r\nContent-Length: 0";
        match parse_response_head(head) {
            Err(TransportError::MalformedTunnelResponse) => (),
            x => panic!("Expected malformed response error, instead got: {:?}", x),
        }
    }

    #[test]
    fn header_end_is_found_across_the_buffer() {
        assert_eq!(find_header_end(b"HTTP/1.1 200 OK\r\n\r\nbody"), Some(15));
        assert_eq!(find_header_end(b"HTTP/1.1 200 OK\r\n"), None);
    }
}
