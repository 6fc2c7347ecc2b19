use bytes::Bytes;

use messages::{MessageDeserializationError, MessageSerializationError, RtmpMessage};

pub fn serialize(data: Bytes) -> Result<Bytes, MessageSerializationError> {
    Ok(data)
}

pub fn deserialize(data: Bytes) -> Result<RtmpMessage, MessageDeserializationError> {
    Ok(RtmpMessage::AudioData { data })
}
