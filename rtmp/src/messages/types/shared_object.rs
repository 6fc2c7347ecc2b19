use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use bytes::Bytes;
use freshet_amf0::{deserialize as amf0_deserialize, serialize as amf0_serialize, Amf0Value};
use std::io::{Cursor, Read, Write};

use messages::{MessageDeserializationError, MessageSerializationError, RtmpMessage};

const EVENT_USE: u8 = 1;
const EVENT_RELEASE: u8 = 2;
const EVENT_REQUEST_CHANGE: u8 = 3;
const EVENT_CHANGE: u8 = 4;
const EVENT_SUCCESS: u8 = 5;
const EVENT_SEND_MESSAGE: u8 = 6;
const EVENT_STATUS: u8 = 7;
const EVENT_CLEAR: u8 = 8;
const EVENT_REMOVE: u8 = 9;
const EVENT_REQUEST_REMOVE: u8 = 10;
const EVENT_USE_SUCCESS: u8 = 11;

/// A single event inside a shared object message.  A message can carry any number of
/// these, and their order is meaningful.
#[derive(PartialEq, Debug, Clone)]
pub enum SharedObjectEvent {
    /// Client asks the server to start tracking the named object
    Use,

    /// Client tells the server it no longer wants the named object
    Release,

    /// Client asks the server to set a property to a new value
    RequestChange { key: String, value: Amf0Value },

    /// Server informs the client that a property was changed by another peer
    Change { key: String, value: Amf0Value },

    /// Server acknowledges a change this client requested
    Success { key: String },

    /// A broadcast message relayed to every peer using the object
    SendMessage { key: String, value: Amf0Value },

    /// Error information for a failed request
    Status { code: String, description: String },

    /// Server instructs the client to discard all of its properties
    Clear,

    /// Server informs the client that a property was deleted
    Remove { key: String },

    /// Client asks the server to delete a property
    RequestRemove { key: String },

    /// Server acknowledges the use request, completing the attachment
    UseSuccess,
}

pub fn serialize(
    name: String,
    version: u32,
    persistent: bool,
    events: Vec<SharedObjectEvent>,
) -> Result<Bytes, MessageSerializationError> {
    let mut cursor = Cursor::new(Vec::new());

    cursor.write_u16::<BigEndian>(name.len() as u16)?;
    cursor.write_all(name.as_bytes())?;
    cursor.write_u32::<BigEndian>(version)?;

    // 8 flag bytes, of which only the persistence flag is used
    cursor.write_u32::<BigEndian>(if persistent { 1 } else { 0 })?;
    cursor.write_u32::<BigEndian>(0)?;

    for event in events {
        write_event(&mut cursor, event)?;
    }

    Ok(Bytes::from(cursor.into_inner()))
}

pub fn deserialize(data: Bytes) -> Result<RtmpMessage, MessageDeserializationError> {
    let mut cursor = Cursor::new(data.as_ref());

    let name = read_utf8(&mut cursor)?;
    let version = cursor.read_u32::<BigEndian>()?;
    let persistent = cursor.read_u32::<BigEndian>()? != 0;
    let _reserved = cursor.read_u32::<BigEndian>()?;

    let mut events = Vec::new();
    while (cursor.position() as usize) < data.len() {
        events.push(read_event(&mut cursor)?);
    }

    Ok(RtmpMessage::SharedObject {
        name,
        version,
        persistent,
        events,
    })
}

fn write_event<W: Write>(
    bytes: &mut W,
    event: SharedObjectEvent,
) -> Result<(), MessageSerializationError> {
    let (type_id, body) = match event {
        SharedObjectEvent::Use => (EVENT_USE, Vec::new()),
        SharedObjectEvent::Release => (EVENT_RELEASE, Vec::new()),
        SharedObjectEvent::Clear => (EVENT_CLEAR, Vec::new()),
        SharedObjectEvent::UseSuccess => (EVENT_USE_SUCCESS, Vec::new()),
        SharedObjectEvent::Success { key } => (EVENT_SUCCESS, key_body(&key)?),
        SharedObjectEvent::Remove { key } => (EVENT_REMOVE, key_body(&key)?),
        SharedObjectEvent::RequestRemove { key } => (EVENT_REQUEST_REMOVE, key_body(&key)?),
        SharedObjectEvent::RequestChange { key, value } => {
            (EVENT_REQUEST_CHANGE, key_value_body(&key, value)?)
        }
        SharedObjectEvent::Change { key, value } => (EVENT_CHANGE, key_value_body(&key, value)?),
        SharedObjectEvent::SendMessage { key, value } => {
            (EVENT_SEND_MESSAGE, key_value_body(&key, value)?)
        }
        SharedObjectEvent::Status { code, description } => {
            let mut body = Cursor::new(Vec::new());
            body.write_u16::<BigEndian>(code.len() as u16)?;
            body.write_all(code.as_bytes())?;
            body.write_u16::<BigEndian>(description.len() as u16)?;
            body.write_all(description.as_bytes())?;
            (EVENT_STATUS, body.into_inner())
        }
    };

    bytes.write_u8(type_id)?;
    bytes.write_u32::<BigEndian>(body.len() as u32)?;
    bytes.write_all(&body)?;

    Ok(())
}

fn key_body(key: &str) -> Result<Vec<u8>, MessageSerializationError> {
    let mut body = Cursor::new(Vec::new());
    body.write_u16::<BigEndian>(key.len() as u16)?;
    body.write_all(key.as_bytes())?;
    Ok(body.into_inner())
}

fn key_value_body(key: &str, value: Amf0Value) -> Result<Vec<u8>, MessageSerializationError> {
    let mut body = key_body(key)?;
    body.extend(amf0_serialize(&vec![value])?);
    Ok(body)
}

fn read_event(cursor: &mut Cursor<&[u8]>) -> Result<SharedObjectEvent, MessageDeserializationError> {
    let type_id = cursor.read_u8()?;
    let body_length = cursor.read_u32::<BigEndian>()? as usize;
    let body_end = cursor.position() as usize + body_length;

    let event = match type_id {
        EVENT_USE => SharedObjectEvent::Use,
        EVENT_RELEASE => SharedObjectEvent::Release,
        EVENT_CLEAR => SharedObjectEvent::Clear,
        EVENT_USE_SUCCESS => SharedObjectEvent::UseSuccess,
        EVENT_SUCCESS => SharedObjectEvent::Success {
            key: read_utf8(cursor)?,
        },
        EVENT_REMOVE => SharedObjectEvent::Remove {
            key: read_utf8(cursor)?,
        },
        EVENT_REQUEST_REMOVE => SharedObjectEvent::RequestRemove {
            key: read_utf8(cursor)?,
        },
        EVENT_REQUEST_CHANGE => {
            let key = read_utf8(cursor)?;
            let value = read_value(cursor, body_end)?;
            SharedObjectEvent::RequestChange { key, value }
        }
        EVENT_CHANGE => {
            let key = read_utf8(cursor)?;
            let value = read_value(cursor, body_end)?;
            SharedObjectEvent::Change { key, value }
        }
        EVENT_SEND_MESSAGE => {
            let key = read_utf8(cursor)?;
            let value = read_value(cursor, body_end)?;
            SharedObjectEvent::SendMessage { key, value }
        }
        EVENT_STATUS => SharedObjectEvent::Status {
            code: read_utf8(cursor)?,
            description: read_utf8(cursor)?,
        },
        _ => return Err(MessageDeserializationError::InvalidMessageFormat),
    };

    if cursor.position() as usize > body_end {
        return Err(MessageDeserializationError::InvalidMessageFormat);
    }

    // Skip anything trailing in the body we did not understand
    cursor.set_position(body_end as u64);
    Ok(event)
}

fn read_utf8(cursor: &mut Cursor<&[u8]>) -> Result<String, MessageDeserializationError> {
    let length = cursor.read_u16::<BigEndian>()? as usize;
    let mut buffer = vec![0_u8; length];
    cursor.read_exact(&mut buffer)?;

    String::from_utf8(buffer).map_err(|_| MessageDeserializationError::InvalidMessageFormat)
}

fn read_value(
    cursor: &mut Cursor<&[u8]>,
    body_end: usize,
) -> Result<Amf0Value, MessageDeserializationError> {
    if cursor.position() as usize >= body_end {
        // Some encoders omit the value entirely
        return Ok(Amf0Value::Null);
    }

    let start = cursor.position() as usize;
    let slice = &cursor.get_ref()[start..body_end];
    let mut value_cursor = Cursor::new(slice);
    let values = amf0_deserialize(&mut value_cursor)?;
    let consumed = value_cursor.position();
    cursor.set_position(start as u64 + consumed);

    values
        .into_iter()
        .next()
        .ok_or(MessageDeserializationError::InvalidMessageFormat)
}

#[cfg(test)]
mod tests {
    use super::SharedObjectEvent;
    use byteorder::{BigEndian, WriteBytesExt};
    use bytes::Bytes;
    use freshet_amf0::{serialize as amf0_serialize, Amf0Value};
    use std::io::{Cursor, Write};

    use messages::RtmpMessage;

    fn write_header(cursor: &mut Cursor<Vec<u8>>, name: &str, version: u32, persistent: bool) {
        cursor.write_u16::<BigEndian>(name.len() as u16).unwrap();
        cursor.write_all(name.as_bytes()).unwrap();
        cursor.write_u32::<BigEndian>(version).unwrap();
        cursor
            .write_u32::<BigEndian>(if persistent { 1 } else { 0 })
            .unwrap();
        cursor.write_u32::<BigEndian>(0).unwrap();
    }

    #[test]
    fn can_serialize_use_event() {
        let mut cursor = Cursor::new(Vec::new());
        write_header(&mut cursor, "level", 0, false);
        cursor.write_u8(1).unwrap();
        cursor.write_u32::<BigEndian>(0).unwrap();
        let expected = cursor.into_inner();

        let raw_message =
            super::serialize("level".to_string(), 0, false, vec![SharedObjectEvent::Use]).unwrap();
        assert_eq!(&raw_message[..], &expected[..]);
    }

    #[test]
    fn can_serialize_request_change_event() {
        let value_bytes = amf0_serialize(&vec![Amf0Value::Number(12.0)]).unwrap();

        let mut cursor = Cursor::new(Vec::new());
        write_header(&mut cursor, "level", 3, true);
        cursor.write_u8(3).unwrap();
        cursor
            .write_u32::<BigEndian>((2 + 5 + value_bytes.len()) as u32)
            .unwrap();
        cursor.write_u16::<BigEndian>(5).unwrap();
        cursor.write_all(b"score").unwrap();
        cursor.write_all(&value_bytes).unwrap();
        let expected = cursor.into_inner();

        let events = vec![SharedObjectEvent::RequestChange {
            key: "score".to_string(),
            value: Amf0Value::Number(12.0),
        }];

        let raw_message = super::serialize("level".to_string(), 3, true, events).unwrap();
        assert_eq!(&raw_message[..], &expected[..]);
    }

    #[test]
    fn can_deserialize_message_with_multiple_events() {
        let value_bytes = amf0_serialize(&vec![Amf0Value::Utf8String("abc".to_string())]).unwrap();

        let mut cursor = Cursor::new(Vec::new());
        write_header(&mut cursor, "level", 5, false);

        cursor.write_u8(4).unwrap();
        cursor
            .write_u32::<BigEndian>((2 + 5 + value_bytes.len()) as u32)
            .unwrap();
        cursor.write_u16::<BigEndian>(5).unwrap();
        cursor.write_all(b"score").unwrap();
        cursor.write_all(&value_bytes).unwrap();

        cursor.write_u8(8).unwrap();
        cursor.write_u32::<BigEndian>(0).unwrap();

        let expected = RtmpMessage::SharedObject {
            name: "level".to_string(),
            version: 5,
            persistent: false,
            events: vec![
                SharedObjectEvent::Change {
                    key: "score".to_string(),
                    value: Amf0Value::Utf8String("abc".to_string()),
                },
                SharedObjectEvent::Clear,
            ],
        };

        let result = super::deserialize(Bytes::from(cursor.into_inner())).unwrap();
        assert_eq!(result, expected);
    }

    #[test]
    fn can_deserialize_status_event() {
        let mut cursor = Cursor::new(Vec::new());
        write_header(&mut cursor, "level", 1, false);
        cursor.write_u8(7).unwrap();
        cursor.write_u32::<BigEndian>((2 + 5 + 2 + 5) as u32).unwrap();
        cursor.write_u16::<BigEndian>(5).unwrap();
        cursor.write_all(b"error").unwrap();
        cursor.write_u16::<BigEndian>(5).unwrap();
        cursor.write_all(b"elror").unwrap();

        let expected = RtmpMessage::SharedObject {
            name: "level".to_string(),
            version: 1,
            persistent: false,
            events: vec![SharedObjectEvent::Status {
                code: "error".to_string(),
                description: "elror".to_string(),
            }],
        };

        let result = super::deserialize(Bytes::from(cursor.into_inner())).unwrap();
        assert_eq!(result, expected);
    }

    #[test]
    fn deserialization_fails_with_unknown_event_type() {
        let mut cursor = Cursor::new(Vec::new());
        write_header(&mut cursor, "level", 1, false);
        cursor.write_u8(55).unwrap();
        cursor.write_u32::<BigEndian>(0).unwrap();

        let result = super::deserialize(Bytes::from(cursor.into_inner()));
        assert!(result.is_err());
    }

    #[test]
    fn all_events_round_trip() {
        let events = vec![
            SharedObjectEvent::Use,
            SharedObjectEvent::Release,
            SharedObjectEvent::RequestChange {
                key: "a".to_string(),
                value: Amf0Value::Number(1.0),
            },
            SharedObjectEvent::Change {
                key: "b".to_string(),
                value: Amf0Value::Boolean(true),
            },
            SharedObjectEvent::Success {
                key: "c".to_string(),
            },
            SharedObjectEvent::SendMessage {
                key: "d".to_string(),
                value: Amf0Value::Utf8String("x".to_string()),
            },
            SharedObjectEvent::Status {
                code: "e".to_string(),
                description: "f".to_string(),
            },
            SharedObjectEvent::Clear,
            SharedObjectEvent::Remove {
                key: "g".to_string(),
            },
            SharedObjectEvent::RequestRemove {
                key: "h".to_string(),
            },
            SharedObjectEvent::UseSuccess,
        ];

        let raw_message =
            super::serialize("level".to_string(), 9, true, events.clone()).unwrap();
        let result = super::deserialize(raw_message).unwrap();

        let expected = RtmpMessage::SharedObject {
            name: "level".to_string(),
            version: 9,
            persistent: true,
            events,
        };

        assert_eq!(result, expected);
    }
}
