//! This module handles the RTMP handshake, as specified in the official RTMP
//! specification.
//!
//! Both peers start by sending a version byte and a packet containing their
//! epoch time and 1528 bytes of random data.  Each peer then echoes the time
//! and random data it received, and the handshake is done once both sides have
//! validated the echo they got back.  Any bytes the peer sent after its echo
//! packet are returned on completion so the chunk layer does not lose them.
//!
//! The same state machine serves both directions, so a client handshake can be
//! tested against a server handshake without a network in between.
//!
//! # Example
//!
//! ```
//! use freshet_rtmp::handshake::{Handshake, HandshakeProcessResult, PeerType};
//!
//! let mut client = Handshake::new(PeerType::Client);
//! let mut server = Handshake::new(PeerType::Server);
//!
//! let c0_and_c1 = client.generate_outbound_p0_and_p1().unwrap();
//! let s0_s1_and_s2 = match server.process_bytes(&c0_and_c1).unwrap() {
//!     HandshakeProcessResult::InProgress { response_bytes } => response_bytes,
//!     HandshakeProcessResult::Completed { .. } => panic!("server finished early"),
//! };
//!
//! let c2 = match client.process_bytes(&s0_s1_and_s2).unwrap() {
//!     HandshakeProcessResult::Completed { response_bytes, .. } => response_bytes,
//!     HandshakeProcessResult::InProgress { .. } => panic!("client did not finish"),
//! };
//!
//! match server.process_bytes(&c2).unwrap() {
//!     HandshakeProcessResult::Completed { .. } => (),
//!     HandshakeProcessResult::InProgress { .. } => panic!("server did not finish"),
//! }
//! ```

mod errors;

pub use self::errors::HandshakeError;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use rand::RngCore;
use std::io::{Cursor, Read, Write};

const RANDOM_DATA_SIZE: usize = 1528;
const PACKET_SIZE: usize = 8 + RANDOM_DATA_SIZE;
const RTMP_VERSION: u8 = 3;

/// Which side of the handshake this instance is performing
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum PeerType {
    /// We dial out, so we speak first with our version byte and packet 1
    Client,

    /// We accept, so we hold our packets until the peer's version byte arrives
    Server,
}

/// The outcome of feeding received bytes into the handshake
#[derive(Eq, PartialEq, Debug)]
pub enum HandshakeProcessResult {
    /// More bytes from the peer are needed.  Any response bytes must be sent
    /// to the peer before reading again.
    InProgress { response_bytes: Vec<u8> },

    /// The handshake concluded successfully.  Any response bytes must still be
    /// sent to the peer, and `remaining_bytes` holds whatever the peer sent
    /// after its own handshake packets (usually the start of chunk data).
    Completed {
        response_bytes: Vec<u8>,
        remaining_bytes: Vec<u8>,
    },
}

#[derive(Eq, PartialEq, Debug, Clone)]
enum Stage {
    WaitingForVersion,
    WaitingForPacket1,
    WaitingForEcho,
    Complete,
}

/// State machine for one RTMP handshake
pub struct Handshake {
    peer_type: PeerType,
    current_stage: Stage,
    my_epoch: u32,
    my_random: [u8; RANDOM_DATA_SIZE],
    sent_p0_and_p1: bool,
    buffer: Vec<u8>,
}

impl Handshake {
    /// Creates a new handshake performing the specified role
    pub fn new(peer_type: PeerType) -> Handshake {
        Handshake {
            peer_type,
            current_stage: Stage::WaitingForVersion,
            my_epoch: 0,
            my_random: create_random_data(),
            sent_p0_and_p1: false,
            buffer: Vec::new(),
        }
    }

    /// Creates the version byte and packet 1 that open our side of the
    /// handshake.  Clients call this before reading anything from the peer.
    /// Servers may skip it, in which case the packets are included in the
    /// response to the peer's own version byte.
    pub fn generate_outbound_p0_and_p1(&mut self) -> Result<Vec<u8>, HandshakeError> {
        let mut bytes = Cursor::new(Vec::with_capacity(1 + PACKET_SIZE));
        bytes.write_u8(RTMP_VERSION)?;
        bytes.write_u32::<BigEndian>(self.my_epoch)?;
        bytes.write_u32::<BigEndian>(0)?;
        bytes.write_all(&self.my_random)?;

        self.sent_p0_and_p1 = true;
        Ok(bytes.into_inner())
    }

    /// Feeds bytes received from the peer into the handshake.  The input can
    /// be split at any byte position, a packet spread over several reads is
    /// reassembled internally.
    pub fn process_bytes(
        &mut self,
        data: &[u8],
    ) -> Result<HandshakeProcessResult, HandshakeError> {
        if self.current_stage == Stage::Complete {
            return Err(HandshakeError::HandshakeAlreadyCompleted);
        }

        self.buffer.extend_from_slice(data);

        let mut response_bytes = Vec::new();
        let mut remaining_bytes = Vec::new();

        loop {
            let starting_stage = self.current_stage.clone();
            match self.current_stage {
                Stage::WaitingForVersion => self.parse_version(&mut response_bytes)?,
                Stage::WaitingForPacket1 => self.parse_packet_1(&mut response_bytes)?,
                Stage::WaitingForEcho => self.parse_echo(&mut remaining_bytes)?,
                Stage::Complete => (),
            }

            if self.current_stage == Stage::Complete || self.current_stage == starting_stage {
                // Staying on the same stage means there weren't enough
                // buffered bytes for the current packet
                break;
            }
        }

        if self.current_stage == Stage::Complete {
            Ok(HandshakeProcessResult::Completed {
                response_bytes,
                remaining_bytes,
            })
        } else {
            Ok(HandshakeProcessResult::InProgress { response_bytes })
        }
    }

    fn parse_version(&mut self, response_bytes: &mut Vec<u8>) -> Result<(), HandshakeError> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        if self.buffer.remove(0) != RTMP_VERSION {
            return Err(HandshakeError::BadVersionId);
        }

        if !self.sent_p0_and_p1 && self.peer_type == PeerType::Server {
            let outbound = self.generate_outbound_p0_and_p1()?;
            response_bytes.extend(outbound);
        }

        self.current_stage = Stage::WaitingForPacket1;
        Ok(())
    }

    fn parse_packet_1(&mut self, response_bytes: &mut Vec<u8>) -> Result<(), HandshakeError> {
        if self.buffer.len() < PACKET_SIZE {
            return Ok(());
        }

        // The peer's time and random data are echoed back verbatim as our
        // packet 2
        let packet: Vec<u8> = self.buffer.drain(..PACKET_SIZE).collect();
        response_bytes.extend(packet);

        self.current_stage = Stage::WaitingForEcho;
        Ok(())
    }

    fn parse_echo(&mut self, remaining_bytes: &mut Vec<u8>) -> Result<(), HandshakeError> {
        if self.buffer.len() < PACKET_SIZE {
            return Ok(());
        }

        let packet: Vec<u8> = self.buffer.drain(..).collect();
        let mut cursor = Cursor::new(packet);

        let time = cursor.read_u32::<BigEndian>()?;
        if time != self.my_epoch {
            return Err(HandshakeError::IncorrectPeerTime);
        }

        let _ = cursor.read_u32::<BigEndian>()?; // time the peer read our packet 1, unchecked

        let mut random_data = [0_u8; RANDOM_DATA_SIZE];
        cursor.read_exact(&mut random_data)?;

        if random_data[..] != self.my_random[..] {
            return Err(HandshakeError::IncorrectRandomData);
        }

        cursor.read_to_end(remaining_bytes)?;

        self.current_stage = Stage::Complete;
        Ok(())
    }
}

fn create_random_data() -> [u8; RANDOM_DATA_SIZE] {
    let mut random_data = [0_u8; RANDOM_DATA_SIZE];
    rand::thread_rng().fill_bytes(&mut random_data);
    random_data
}
