use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use bytes::Bytes;
use std::io::{Cursor, Read, Write};

use messages::{MessageDeserializationError, MessagePayload, MessageSerializationError, RtmpMessage};
use time::RtmpTimestamp;

// Sub-messages use the FLV tag layout: a type byte, a 3 byte payload size, a 3 byte
// timestamp with 1 extension byte for the upper bits, and a 3 byte stream id.  Each
// tag is followed by a 4 byte back pointer covering the header plus the payload.
const TAG_HEADER_SIZE: u32 = 11;

pub fn serialize(messages: Vec<MessagePayload>) -> Result<Bytes, MessageSerializationError> {
    let mut cursor = Cursor::new(Vec::new());

    for message in messages {
        let size = message.data.len() as u32;
        cursor.write_u8(message.type_id)?;
        cursor.write_u24::<BigEndian>(size)?;
        cursor.write_u24::<BigEndian>(message.timestamp.value & 0x00ff_ffff)?;
        cursor.write_u8((message.timestamp.value >> 24) as u8)?;
        cursor.write_u24::<BigEndian>(message.message_stream_id & 0x00ff_ffff)?;
        cursor.write_all(&message.data)?;
        cursor.write_u32::<BigEndian>(TAG_HEADER_SIZE + size)?;
    }

    Ok(Bytes::from(cursor.into_inner()))
}

pub fn deserialize(data: Bytes) -> Result<RtmpMessage, MessageDeserializationError> {
    let mut cursor = Cursor::new(data.as_ref());
    let mut messages = Vec::new();

    while (cursor.position() as usize) < data.len() {
        let type_id = cursor.read_u8()?;
        let size = cursor.read_u24::<BigEndian>()?;
        let timestamp = cursor.read_u24::<BigEndian>()?;
        let timestamp_extended = cursor.read_u8()?;
        let message_stream_id = cursor.read_u24::<BigEndian>()?;

        let mut payload = vec![0_u8; size as usize];
        cursor.read_exact(&mut payload)?;

        let back_pointer = cursor.read_u32::<BigEndian>()?;
        if back_pointer != TAG_HEADER_SIZE + size {
            return Err(MessageDeserializationError::InvalidMessageFormat);
        }

        messages.push(MessagePayload {
            timestamp: RtmpTimestamp::new(((timestamp_extended as u32) << 24) | timestamp),
            type_id,
            message_stream_id,
            data: Bytes::from(payload),
        });
    }

    Ok(RtmpMessage::Aggregate { messages })
}
