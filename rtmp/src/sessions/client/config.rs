/// Configuration options that govern how a RTMP client session should operate
#[derive(Clone)]
pub struct ClientSessionConfig {
    /// The flash version string advertised in the `connect` command
    pub flash_version: String,

    /// How many milliseconds of content the client intends to buffer during playback
    pub playback_buffer_length_ms: u32,

    /// How many bytes the peer may send before we require an acknowledgement
    pub window_ack_size: u32,

    /// The outbound max chunk size announced once a connection is accepted
    pub chunk_size: u32,

    /// Full url the connection was made against, advertised as `tcUrl`
    pub tc_url: Option<String>,

    /// Url of the swf file making the connection, advertised as `swfUrl`
    pub swf_url: Option<String>,

    /// Url of the page hosting the client, advertised as `pageUrl`
    pub page_url: Option<String>,
}

impl ClientSessionConfig {
    /// Creates a new configuration object with default values
    pub fn new() -> ClientSessionConfig {
        ClientSessionConfig {
            flash_version: "FMLE/3.0 (compatible; FMSc/1.0)".to_string(),
            playback_buffer_length_ms: 2_000,
            window_ack_size: 2_500_000,
            chunk_size: 8192,
            tc_url: None,
            swf_url: None,
            page_url: None,
        }
    }
}
