use messages::MessageSerializationError;
use std::io;
use thiserror::Error;

/// Enumeration that represents the various errors that may occur while trying to
/// serialize an RTMP message into RTMP chunks
#[derive(Debug, Error)]
pub enum ChunkSerializationError {
    /// The message payload is larger than the chunking format can describe
    #[error("The message is too long ({size} bytes), only messages up to 16777215 bytes are supported")]
    MessageTooLong { size: u32 },

    /// Requested an invalid max chunk size
    #[error("Cannot set the max chunk size to {attempted_chunk_size} as it exceeds the allowed maximum")]
    InvalidMaxChunkSize { attempted_chunk_size: u32 },

    /// Changing the max chunk size requires serializing a SetChunkSize message, which failed
    #[error("Failed to create a SetChunkSize message: {0}")]
    SetChunkSizeMessageCreation(#[from] MessageSerializationError),

    /// Failed to write the chunk to the output buffer
    #[error("An IO error occurred while writing the output: {0}")]
    Io(#[from] io::Error),
}
