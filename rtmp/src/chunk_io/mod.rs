/*!
This module provides functionality for converting RTMP messages into (and from) RTMP chunks,
the transmission framing that actually goes over the wire.

Chunk streams are stateful in both directions.  Every chunk header can omit fields that
match the previous chunk on the same chunk stream id, so a single serializer and a single
deserializer must be used for the lifetime of a connection.
*/

mod chunk_header;
mod deserialization_errors;
mod deserializer;
mod serialization_errors;
mod serializer;

pub use self::deserialization_errors::ChunkDeserializationError;
pub use self::deserializer::ChunkDeserializer;
pub use self::serialization_errors::ChunkSerializationError;
pub use self::serializer::{ChunkSerializer, Packet};
