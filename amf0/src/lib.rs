//! This crate provides functionality for serializing and deserializing data
//! based on the Adobe AMF0 encoding specification located at
//! <https://wwwimages2.adobe.com/content/dam/acom/en/devnet/pdf/amf0-file-format-specification.pdf>
//!
//! Objects keep their properties in insertion order, since RTMP servers are known
//! to care about the order of keys in command objects.
//!
//! # Examples
//! ```
//! use std::io::Cursor;
//! use freshet_amf0::{Amf0Object, Amf0Value, serialize, deserialize};
//!
//! // Put some data into the Amf0Value types
//! let mut properties = Amf0Object::new();
//! properties.insert("app", Amf0Value::Number(99.0));
//! properties.insert("second", Amf0Value::Utf8String("test".to_string()));
//!
//! let value1 = Amf0Value::Number(32.0);
//! let value2 = Amf0Value::Boolean(true);
//! let object = Amf0Value::Object(properties);
//!
//! let input = vec![value1, object, value2];
//!
//! // Serialize the values into a vector of bytes
//! let serialized_data = serialize(&input).unwrap();
//!
//! // Deserialize the vector of bytes back into Amf0Value types
//! let mut serialized_cursor = Cursor::new(serialized_data);
//! let results = deserialize(&mut serialized_cursor).unwrap();
//!
//! assert_eq!(input, results);
//! ```

extern crate byteorder;
extern crate thiserror;

mod deserialization;
mod errors;
mod serialization;

pub use deserialization::deserialize;
pub use errors::{Amf0DeserializationError, Amf0SerializationError};
pub use serialization::serialize;

/// An Enum representing the different supported types of Amf0 values
#[derive(PartialEq, Debug, Clone)]
pub enum Amf0Value {
    Number(f64),
    Boolean(bool),
    Utf8String(String),
    Object(Amf0Object),
    StrictArray(Vec<Amf0Value>),
    /// Unix epoch in milliseconds.  The wire format carries a time zone field as
    /// well but it is reserved, always written as zero and ignored when read.
    Date(f64),
    Null,
    Undefined,
}

impl Amf0Value {
    pub fn get_number(self) -> Option<f64> {
        match self {
            Amf0Value::Number(value) => Some(value),
            _ => None,
        }
    }

    pub fn get_boolean(self) -> Option<bool> {
        match self {
            Amf0Value::Boolean(value) => Some(value),
            _ => None,
        }
    }

    pub fn get_string(self) -> Option<String> {
        match self {
            Amf0Value::Utf8String(value) => Some(value),
            _ => None,
        }
    }

    pub fn get_object_properties(self) -> Option<Amf0Object> {
        match self {
            Amf0Value::Object(properties) => Some(properties),
            _ => None,
        }
    }
}

/// An AMF0 object: a key to value map that remembers the order properties were
/// added in.  Duplicate keys are last-write-wins, with the property staying at
/// its original position.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Amf0Object {
    properties: Vec<(String, Amf0Value)>,
}

impl Amf0Object {
    pub fn new() -> Amf0Object {
        Amf0Object { properties: Vec::new() }
    }

    pub fn insert<K: Into<String>>(&mut self, key: K, value: Amf0Value) {
        let key = key.into();
        for property in self.properties.iter_mut() {
            if property.0 == key {
                property.1 = value;
                return;
            }
        }

        self.properties.push((key, value));
    }

    pub fn get(&self, key: &str) -> Option<&Amf0Value> {
        self.properties
            .iter()
            .find(|property| property.0 == key)
            .map(|property| &property.1)
    }

    pub fn remove(&mut self, key: &str) -> Option<Amf0Value> {
        let index = self.properties.iter().position(|property| property.0 == key)?;
        Some(self.properties.remove(index).1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Amf0Value)> {
        self.properties.iter().map(|property| (&property.0, &property.1))
    }
}

impl IntoIterator for Amf0Object {
    type Item = (String, Amf0Value);
    type IntoIter = std::vec::IntoIter<(String, Amf0Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.properties.into_iter()
    }
}

impl std::iter::FromIterator<(String, Amf0Value)> for Amf0Object {
    fn from_iter<T: IntoIterator<Item = (String, Amf0Value)>>(iter: T) -> Amf0Object {
        let mut object = Amf0Object::new();
        for (key, value) in iter {
            object.insert(key, value);
        }

        object
    }
}

mod markers {
    pub const NUMBER_MARKER: u8 = 0;
    pub const BOOLEAN_MARKER: u8 = 1;
    pub const STRING_MARKER: u8 = 2;
    pub const OBJECT_MARKER: u8 = 3;
    pub const NULL_MARKER: u8 = 5;
    pub const UNDEFINED_MARKER: u8 = 6;
    pub const ECMA_ARRAY_MARKER: u8 = 8;
    pub const OBJECT_END_MARKER: u8 = 9;
    pub const STRICT_ARRAY_MARKER: u8 = 10;
    pub const DATE_MARKER: u8 = 11;
    pub const UTF_8_EMPTY_MARKER: u16 = 0;
}
