use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use bytes::Bytes;
use std::io::Cursor;

use messages::{MessageDeserializationError, MessageSerializationError, RtmpMessage};

pub fn serialize(stream_id: u32) -> Result<Bytes, MessageSerializationError> {
    let mut cursor = Cursor::new(Vec::new());
    cursor.write_u32::<BigEndian>(stream_id)?;

    Ok(Bytes::from(cursor.into_inner()))
}

pub fn deserialize(data: Bytes) -> Result<RtmpMessage, MessageDeserializationError> {
    let mut cursor = Cursor::new(data);
    let stream_id = cursor.read_u32::<BigEndian>()?;

    Ok(RtmpMessage::Abort { stream_id })
}

#[cfg(test)]
mod tests {
    use byteorder::{BigEndian, WriteBytesExt};
    use bytes::Bytes;
    use std::io::Cursor;

    use messages::RtmpMessage;

    #[test]
    fn can_serialize_message() {
        let stream_id = 523;

        let mut cursor = Cursor::new(Vec::new());
        cursor.write_u32::<BigEndian>(stream_id).unwrap();
        let expected = cursor.into_inner();

        let raw_message = super::serialize(stream_id).unwrap();
        assert_eq!(&raw_message[..], &expected[..]);
    }

    #[test]
    fn can_deserialize_message() {
        let stream_id = 532;
        let expected = RtmpMessage::Abort { stream_id };

        let mut cursor = Cursor::new(Vec::new());
        cursor.write_u32::<BigEndian>(stream_id).unwrap();

        let result = super::deserialize(Bytes::from(cursor.into_inner())).unwrap();
        assert_eq!(result, expected);
    }
}
