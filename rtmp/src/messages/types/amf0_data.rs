use bytes::Bytes;
use freshet_amf0::{deserialize as amf0_deserialize, serialize as amf0_serialize, Amf0Value};
use std::io::Cursor;

use messages::{MessageDeserializationError, MessageSerializationError, RtmpMessage};

pub fn serialize(values: Vec<Amf0Value>) -> Result<Bytes, MessageSerializationError> {
    let bytes = amf0_serialize(&values)?;
    Ok(Bytes::from(bytes))
}

pub fn deserialize(data: Bytes) -> Result<RtmpMessage, MessageDeserializationError> {
    let mut cursor = Cursor::new(data.as_ref());
    let values = amf0_deserialize(&mut cursor)?;

    Ok(RtmpMessage::Amf0Data { values })
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use freshet_amf0::{serialize as amf0_serialize, Amf0Value};

    use messages::RtmpMessage;

    #[test]
    fn can_serialize_message() {
        let values = vec![Amf0Value::Number(15.0), Amf0Value::Utf8String("test".to_string())];
        let expected = amf0_serialize(&values).unwrap();

        let raw_message = super::serialize(values).unwrap();
        assert_eq!(&raw_message[..], &expected[..]);
    }

    #[test]
    fn can_deserialize_message() {
        let values = vec![Amf0Value::Number(15.0), Amf0Value::Utf8String("test".to_string())];
        let bytes = amf0_serialize(&values).unwrap();

        let expected = RtmpMessage::Amf0Data { values };
        let result = super::deserialize(Bytes::from(bytes)).unwrap();
        assert_eq!(result, expected);
    }
}
