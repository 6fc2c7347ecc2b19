use super::chunk_header::{ChunkHeader, ChunkHeaderFormat};
use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use chunk_io::ChunkSerializationError;
use messages::{MessagePayload, RtmpMessage};
use std::cmp::min;
use std::collections::HashMap;
use std::io::{Cursor, Write};
use time::RtmpTimestamp;

const INITIAL_MAX_CHUNK_SIZE: u32 = 128;
const MAX_INITIAL_TIMESTAMP: u32 = 16777215;

/// An outbound data blob containing at least one RTMP chunk with a single RTMP message.
///
/// A packet can be flagged as droppable.  Audio and video messages that are not
/// codec headers may be discarded by the transport when the connection cannot keep up
/// with the bitrate, which keeps a live stream close to real time instead of falling
/// further and further behind.
#[derive(Debug, PartialEq)]
pub struct Packet {
    pub bytes: Vec<u8>,
    pub can_be_dropped: bool,
}

/// Allows serializing RTMP messages into RTMP chunks.
///
/// Due to the nature of the RTMP chunking protocol, the same serializer should be used
/// for all messages that need to be sent to the same peer.
pub struct ChunkSerializer {
    previous_headers: HashMap<u32, ChunkHeader>,
    max_chunk_size: u32,
}

impl ChunkSerializer {
    /// Creates a new `ChunkSerializer`.
    ///
    /// Per the RTMP specification a new serializer starts with a max chunk size of 128
    /// bytes.  To change this amount a call to `set_max_chunk_size()` is required.
    pub fn new() -> ChunkSerializer {
        ChunkSerializer {
            max_chunk_size: INITIAL_MAX_CHUNK_SIZE,
            previous_headers: HashMap::new(),
        }
    }

    /// Changes the maximum number of message bytes that will be placed into a single RTMP chunk.
    ///
    /// The receiver must be told about the change before any chunk using the new size reaches
    /// it, so this method serializes a `SetChunkSize` message and returns it as a packet.  That
    /// packet *must* be sent to the peer and cannot be ignored.
    pub fn set_max_chunk_size(
        &mut self,
        new_size: u32,
        time: RtmpTimestamp,
    ) -> Result<Packet, ChunkSerializationError> {
        if new_size > 2147483647 {
            return Err(ChunkSerializationError::InvalidMaxChunkSize {
                attempted_chunk_size: new_size,
            });
        }

        let set_chunk_size_message = RtmpMessage::SetChunkSize { size: new_size };
        let message_payload = MessagePayload::from_rtmp_message(set_chunk_size_message, time, 0)?;
        let packet = self.serialize(&message_payload, true, false)?;

        self.max_chunk_size = new_size;
        Ok(packet)
    }

    /// Turns an RTMP message payload into binary data (representing RTMP chunks) that can be
    /// sent over the network.
    ///
    /// The RTMP chunk format has a basic form of header compression.  When a chunk shares
    /// header information with the previous chunk on the same chunk stream, the subsequent
    /// chunk can omit that information and flag itself as inheriting it.
    ///
    /// This compression can be bypassed by setting `force_uncompressed` to `true`.  Some
    /// servers require the initial messages after a handshake to be full type 0 chunks and
    /// will not function without it.
    ///
    /// If the message is audio or video data (and not a codec header) then it can be safe to
    /// set `can_be_dropped` to `true`.  A flagged packet may be discarded by the transport
    /// under backpressure, and the serializer makes sure that dropping it cannot corrupt
    /// the header compression state for any chunk that follows it.
    pub fn serialize(
        &mut self,
        message: &MessagePayload,
        force_uncompressed: bool,
        can_be_dropped: bool,
    ) -> Result<Packet, ChunkSerializationError> {
        if message.data.len() > 16777215 {
            return Err(ChunkSerializationError::MessageTooLong {
                size: message.data.len() as u32,
            });
        }

        let mut bytes = Cursor::new(Vec::new());

        // A message may be larger than one chunk allows, so split the payload into
        // slices that don't exceed the max chunk length
        let mut slices = Vec::<&[u8]>::new();

        // A zero length message still needs its header chunk on the wire
        if message.data.is_empty() {
            slices.push(&[]);
        }

        let mut iteration = 0;
        loop {
            let start_index = iteration * self.max_chunk_size as usize;
            if start_index >= message.data.len() {
                break;
            }

            let end_index = min(start_index + self.max_chunk_size as usize, message.data.len());
            slices.push(&message.data[start_index..end_index]);

            iteration += 1;
        }

        for (idx, slice) in slices.into_iter().enumerate() {
            self.add_chunk(
                &mut bytes,
                force_uncompressed,
                message,
                idx > 0,
                slice,
                can_be_dropped,
            )?;
        }

        Ok(Packet {
            bytes: bytes.into_inner(),
            can_be_dropped,
        })
    }

    fn add_chunk(
        &mut self,
        bytes: &mut Cursor<Vec<u8>>,
        force_uncompressed: bool,
        message: &MessagePayload,
        continued_chunk: bool,
        data_to_write: &[u8],
        can_be_dropped: bool,
    ) -> Result<(), ChunkSerializationError> {
        let mut header = ChunkHeader {
            chunk_stream_id: get_csid_for_message(message.type_id, message.message_stream_id),
            timestamp: message.timestamp,
            timestamp_field: 0,
            message_type_id: message.type_id,
            message_stream_id: message.message_stream_id,
            message_length: message.data.len() as u32,
            can_be_dropped,
        };

        let header_format = if force_uncompressed {
            ChunkHeaderFormat::Full
        } else if continued_chunk {
            // Continuation chunks of a split message must use format 3
            ChunkHeaderFormat::Empty
        } else {
            match self.previous_headers.get(&header.chunk_stream_id) {
                None => ChunkHeaderFormat::Full,
                Some(previous_header) => {
                    // If the previous packet was droppable we don't know if it actually made
                    // it out, so the next chunk must carry a full header.  Otherwise the peer
                    // may not be able to deserialize it.
                    if previous_header.can_be_dropped {
                        ChunkHeaderFormat::Full
                    } else {
                        let time_delta = header.timestamp - previous_header.timestamp;
                        header.timestamp_field = time_delta.value;

                        get_header_format(&mut header, previous_header)
                    }
                }
            }
        };

        add_basic_header(bytes, &header_format, header.chunk_stream_id)?;
        add_initial_timestamp(bytes, &header_format, &header)?;
        add_message_length_and_type_id(
            bytes,
            &header_format,
            header.message_length,
            header.message_type_id,
        )?;
        add_message_stream_id(bytes, &header_format, header.message_stream_id)?;
        add_extended_timestamp(bytes, &header_format, &header)?;
        bytes.write_all(data_to_write)?;

        self.previous_headers.insert(header.chunk_stream_id, header);
        Ok(())
    }
}

fn add_basic_header(
    bytes: &mut dyn Write,
    format: &ChunkHeaderFormat,
    csid: u32,
) -> Result<(), ChunkSerializationError> {
    debug_assert!(
        csid >= 2 && csid < 65600,
        "Only csids between 2 and 65599 can be encoded"
    );

    let format_mask = match *format {
        ChunkHeaderFormat::Full => 0b00000000,
        ChunkHeaderFormat::TimeDeltaWithoutMessageStreamId => 0b01000000,
        ChunkHeaderFormat::TimeDeltaOnly => 0b10000000,
        ChunkHeaderFormat::Empty => 0b11000000,
    };

    if csid <= 63 {
        bytes.write_u8(format_mask | csid as u8)?;
    } else if csid <= 319 {
        bytes.write_u8(format_mask)?;
        bytes.write_u8((csid - 64) as u8)?;
    } else {
        bytes.write_u8(format_mask | 1)?;
        bytes.write_u16::<LittleEndian>((csid - 64) as u16)?;
    }

    Ok(())
}

fn add_initial_timestamp(
    bytes: &mut Cursor<Vec<u8>>,
    format: &ChunkHeaderFormat,
    header: &ChunkHeader,
) -> Result<(), ChunkSerializationError> {
    if *format == ChunkHeaderFormat::Empty {
        return Ok(());
    }

    let value_to_write = match *format {
        ChunkHeaderFormat::Full => header.timestamp.value,
        _ => header.timestamp_field,
    };

    let capped_value = min(value_to_write, MAX_INITIAL_TIMESTAMP);
    bytes.write_u24::<BigEndian>(capped_value)?;

    Ok(())
}

fn add_message_length_and_type_id(
    bytes: &mut Cursor<Vec<u8>>,
    format: &ChunkHeaderFormat,
    length: u32,
    type_id: u8,
) -> Result<(), ChunkSerializationError> {
    if *format == ChunkHeaderFormat::Empty || *format == ChunkHeaderFormat::TimeDeltaOnly {
        return Ok(());
    }

    bytes.write_u24::<BigEndian>(length)?;
    bytes.write_u8(type_id)?;
    Ok(())
}

fn add_message_stream_id(
    bytes: &mut dyn Write,
    format: &ChunkHeaderFormat,
    stream_id: u32,
) -> Result<(), ChunkSerializationError> {
    if *format != ChunkHeaderFormat::Full {
        return Ok(());
    }

    bytes.write_u32::<LittleEndian>(stream_id)?;
    Ok(())
}

fn add_extended_timestamp(
    bytes: &mut dyn Write,
    format: &ChunkHeaderFormat,
    header: &ChunkHeader,
) -> Result<(), ChunkSerializationError> {
    let timestamp = match *format {
        ChunkHeaderFormat::Full => header.timestamp.value,
        ChunkHeaderFormat::Empty => {
            if header.timestamp_field == 0 {
                header.timestamp.value
            } else {
                header.timestamp_field
            }
        }
        _ => header.timestamp_field,
    };

    if timestamp < MAX_INITIAL_TIMESTAMP {
        return Ok(());
    }

    bytes.write_u32::<BigEndian>(timestamp)?;
    Ok(())
}

fn get_csid_for_message(message_type_id: u8, message_stream_id: u32) -> u32 {
    // Spreading message categories across chunk stream ids keeps header compression
    // effective, since repeated messages of the same shape land on the same csid.
    // Media messages get a csid derived from their message stream id so that chunks
    // for separate streams never interleave on a single chunk stream.
    match message_type_id {
        1 | 2 | 3 | 4 | 5 | 6 => 2,
        18 | 19 | 20 => 3,
        9 => 4 + (message_stream_id % 16) * 3,
        8 => 5 + (message_stream_id % 16) * 3,
        _ => 6,
    }
}

fn get_header_format(
    current_header: &mut ChunkHeader,
    previous_header: &ChunkHeader,
) -> ChunkHeaderFormat {
    if current_header.message_stream_id != previous_header.message_stream_id {
        return ChunkHeaderFormat::Full;
    }

    if current_header.message_type_id != previous_header.message_type_id
        || current_header.message_length != previous_header.message_length
    {
        return ChunkHeaderFormat::TimeDeltaWithoutMessageStreamId;
    }

    if current_header.timestamp_field != previous_header.timestamp_field {
        return ChunkHeaderFormat::TimeDeltaOnly;
    }

    ChunkHeaderFormat::Empty
}
