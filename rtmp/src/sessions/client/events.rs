use bytes::Bytes;
use freshet_amf0::Amf0Value;
use messages::SharedObjectEvent;
use sessions::StreamMetadata;
use time::RtmpTimestamp;

/// Events that can be raised by the client session so that custom business logic can be
/// written to react to it
#[derive(PartialEq, Debug)]
pub enum ClientSessionEvent {
    /// Raised when a connection request has been accepted by the server
    ConnectionRequestAccepted,

    /// The server has rejected the connection request
    ConnectionRequestRejected { description: String },

    /// Raised when the server accepts playback on the requested stream key
    PlaybackRequestAccepted,

    /// Raised when the server accepts publishing on the requested stream key
    PublishRequestAccepted,

    /// Raised when the stream being played back announces its metadata
    StreamMetadataReceived { metadata: StreamMetadata },

    /// Raised when video data is received on the stream being played back
    VideoDataReceived {
        data: Bytes,
        timestamp: RtmpTimestamp,
    },

    /// Raised when audio data is received on the stream being played back
    AudioDataReceived {
        data: Bytes,
        timestamp: RtmpTimestamp,
    },

    /// Raised when a shared object message arrives, so the state of the named object
    /// can be synchronized
    SharedObjectMessageReceived {
        name: String,
        version: u32,
        persistent: bool,
        events: Vec<SharedObjectEvent>,
    },

    /// The server answered one of our ping requests
    PingResponseReceived { timestamp: RtmpTimestamp },

    /// The server acknowledged receipt of the specified number of bytes
    AcknowledgementReceived { sequence_number: u32 },

    /// The server sent an Amf0 command that was not able to be handled
    UnhandleableAmf0Command {
        command_name: String,
        transaction_id: f64,
        command_object: Amf0Value,
        additional_values: Vec<Amf0Value>,
    },

    /// The server answered a command the session does not track itself (one sent via
    /// `send_command_request()`, or a transaction we have no record of).  `success`
    /// distinguishes a `_result` reply from an `_error` reply.
    CommandResponseReceived {
        transaction_id: f64,
        success: bool,
        command_object: Amf0Value,
        additional_values: Vec<Amf0Value>,
    },

    /// The server sent an informational status notification the session does not act
    /// on itself (e.g. `NetStream.Play.Reset` or `NetConnection.Connect.Closed`)
    StatusReceived { code: String, description: String },
}
