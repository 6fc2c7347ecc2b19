use std::{io, string};
use thiserror::Error;

/// Errors raised when turning AMF0 encoded bytes back into values
#[derive(Debug, Error)]
pub enum Amf0DeserializationError {
    /// Encountered a type marker we don't know how to decode
    #[error("Encountered unknown marker: {marker}")]
    UnknownMarker { marker: u8 },

    /// An object property had an empty name but was not followed by the object
    /// end marker
    #[error("Unexpected empty object property name")]
    UnexpectedEmptyObjectPropertyName,

    /// The buffer ended partway through a value.  Decoding never reads past the
    /// supplied buffer, truncated input fails with this instead.
    #[error("Input ended in the middle of a value")]
    UnexpectedEof,

    /// An I/O error occurred while reading the input
    #[error("{0}")]
    Io(io::Error),

    /// A string field did not contain valid UTF-8
    #[error("{0}")]
    FromUtf8Error(#[from] string::FromUtf8Error),
}

impl From<io::Error> for Amf0DeserializationError {
    fn from(error: io::Error) -> Self {
        // Running out of bytes mid-value is a property of the input, not of the
        // reader, so it gets its own variant.
        if error.kind() == io::ErrorKind::UnexpectedEof {
            Amf0DeserializationError::UnexpectedEof
        } else {
            Amf0DeserializationError::Io(error)
        }
    }
}

/// Errors raised when serializing values into AMF0 encoded bytes
#[derive(Debug, Error)]
pub enum Amf0SerializationError {
    /// Normal strings (and object property names) cannot be longer than 65,535 bytes
    #[error("String length greater than 65,535")]
    NormalStringTooLong,

    /// An I/O error occurred while writing the output
    #[error("{0}")]
    Io(#[from] io::Error),
}
