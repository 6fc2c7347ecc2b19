use std::time::Duration;

use sessions::ClientSessionConfig;

/// Configuration options for a connection
#[derive(Clone)]
pub struct ConnectionConfig {
    /// How long a single transport read may block before giving control back to the
    /// driver loop
    pub read_timeout: Duration,

    /// How long the handshake may take in total before the connection attempt is
    /// abandoned
    pub handshake_timeout: Duration,

    /// Configuration handed to the client session once the handshake completes
    pub session: ClientSessionConfig,
}

impl ConnectionConfig {
    pub fn new() -> ConnectionConfig {
        ConnectionConfig {
            read_timeout: Duration::from_millis(100),
            handshake_timeout: Duration::from_secs(5),
            session: ClientSessionConfig::new(),
        }
    }
}
