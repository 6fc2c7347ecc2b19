use bytes::Bytes;
use freshet_amf0::{deserialize as amf0_deserialize, serialize as amf0_serialize, Amf0Value};
use std::io::Cursor;

use messages::{MessageDeserializationError, MessageSerializationError, RtmpMessage};

pub fn serialize(
    name: String,
    transaction_id: f64,
    command_object: Amf0Value,
    additional_arguments: Vec<Amf0Value>,
) -> Result<Bytes, MessageSerializationError> {
    let mut values = vec![
        Amf0Value::Utf8String(name),
        Amf0Value::Number(transaction_id),
        command_object,
    ];

    values.extend(additional_arguments);

    let bytes = amf0_serialize(&values)?;
    Ok(Bytes::from(bytes))
}

pub fn deserialize(data: Bytes) -> Result<RtmpMessage, MessageDeserializationError> {
    let mut cursor = Cursor::new(data.as_ref());
    let mut values = amf0_deserialize(&mut cursor)?;

    if values.len() < 3 {
        return Err(MessageDeserializationError::InvalidMessageFormat);
    }

    // Command messages always start with the command name, the transaction id, and
    // the command object (which may be null).
    let additional_arguments = values.split_off(3);
    let mut iter = values.into_iter();

    let name = match iter.next() {
        Some(Amf0Value::Utf8String(value)) => value,
        _ => return Err(MessageDeserializationError::InvalidMessageFormat),
    };

    let transaction_id = match iter.next() {
        Some(Amf0Value::Number(value)) => value,
        _ => return Err(MessageDeserializationError::InvalidMessageFormat),
    };

    let command_object = match iter.next() {
        Some(value) => value,
        None => return Err(MessageDeserializationError::InvalidMessageFormat),
    };

    Ok(RtmpMessage::Amf0Command {
        command_name: name,
        transaction_id,
        command_object,
        additional_arguments,
    })
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use freshet_amf0::{serialize as amf0_serialize, Amf0Value};

    use messages::RtmpMessage;

    #[test]
    fn can_serialize_message() {
        let name = "command".to_string();
        let transaction_id = 12.0;
        let command_object = Amf0Value::Number(15.0);
        let additional_arguments = vec![Amf0Value::Boolean(true)];

        let raw_message = super::serialize(
            name.clone(),
            transaction_id,
            command_object.clone(),
            additional_arguments.clone(),
        )
        .unwrap();

        let mut expected_values = vec![
            Amf0Value::Utf8String(name),
            Amf0Value::Number(transaction_id),
            command_object,
        ];
        expected_values.extend(additional_arguments);
        let expected = amf0_serialize(&expected_values).unwrap();

        assert_eq!(&raw_message[..], &expected[..]);
    }

    #[test]
    fn can_deserialize_message() {
        let name = "command".to_string();
        let transaction_id = 12.0;
        let command_object = Amf0Value::Number(15.0);
        let additional_arguments = vec![Amf0Value::Boolean(true)];

        let values = vec![
            Amf0Value::Utf8String(name.clone()),
            Amf0Value::Number(transaction_id),
            command_object.clone(),
            Amf0Value::Boolean(true),
        ];

        let bytes = amf0_serialize(&values).unwrap();
        let result = super::deserialize(Bytes::from(bytes)).unwrap();

        let expected = RtmpMessage::Amf0Command {
            command_name: name,
            transaction_id,
            command_object,
            additional_arguments,
        };

        assert_eq!(result, expected);
    }

    #[test]
    fn deserialization_fails_without_command_object() {
        let values = vec![
            Amf0Value::Utf8String("command".to_string()),
            Amf0Value::Number(12.0),
        ];

        let bytes = amf0_serialize(&values).unwrap();
        let result = super::deserialize(Bytes::from(bytes));
        assert!(result.is_err());
    }
}
