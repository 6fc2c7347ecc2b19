use chunk_io::Packet;
use messages::MessagePayload;
use sessions::client::ClientSessionEvent;

/// A single result that is returned when the client session performs an action
/// or receives messages from the server.
#[derive(PartialEq, Debug)]
pub enum ClientSessionResult {
    /// A packet that is slated to be sent to the peer.  Packets should *ALWAYS* be sent
    /// in the order they are produced and can only be dropped if explicitly marked as
    /// droppable.  Failing to do so may cause RTMP chunk deserialization errors on the
    /// other end due to RTMP chunk header compression.
    OutboundResponse(Packet),

    /// An event the client session is raising so consuming applications can perform
    /// custom logic
    RaisedEvent(ClientSessionEvent),

    /// The session received a message that it could not handle.  This result allows the
    /// consuming application to do something with it if it wants to.
    UnhandleableMessageReceived(MessagePayload),
}
