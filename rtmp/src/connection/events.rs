use bytes::Bytes;

use sessions::StreamMetadata;
use shared_object::SharedObjectNotification;
use time::RtmpTimestamp;

/// Events raised while servicing a connection, so applications can react to the state
/// of the conversation with the server
#[derive(PartialEq, Debug)]
pub enum ConnectionEvent {
    /// The server accepted our connect request
    Connected,

    /// The server rejected our connect request (authentication retries, when they were
    /// possible, have already been exhausted)
    ConnectionRejected { description: String },

    /// The connection has been torn down, either by the server or by a local close
    Closed,

    /// The server accepted our publish request and media can be sent
    PublishStarted,

    /// The server accepted our play request and media will start arriving
    PlaybackStarted,

    /// The stream being played back announced its metadata
    MetadataReceived { metadata: StreamMetadata },

    /// Video data arrived on the stream being played back
    VideoDataReceived {
        data: Bytes,
        timestamp: RtmpTimestamp,
    },

    /// Audio data arrived on the stream being played back
    AudioDataReceived {
        data: Bytes,
        timestamp: RtmpTimestamp,
    },

    /// An attached shared object processed a message from the server
    SharedObjectSynchronized(SharedObjectNotification),

    /// The server answered one of our ping requests
    PingResponseReceived { timestamp: RtmpTimestamp },

    /// The server acknowledged receipt of the specified number of bytes
    AcknowledgementReceived { sequence_number: u32 },

    /// The server sent a status notification the connection does not act on itself
    StatusReceived { code: String, description: String },

    /// The outgoing queue depth has been rising for several consecutive statistics
    /// ticks, suggesting the network cannot keep up with the published bitrate.  This
    /// is a hint to reduce quality, not a hard error.
    BandwidthDegraded { queued_byte_count: usize },

    /// Periodic throughput statistics, sampled once per second
    Statistics {
        bytes_in_per_second: u64,
        bytes_out_per_second: u64,
        queued_byte_count: usize,
    },
}
