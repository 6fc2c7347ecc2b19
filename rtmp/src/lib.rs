//! Client side implementation of the RTMP protocol stack.
//!
//! The protocol pieces (handshake, chunk streams, message types, and the
//! client session) are sans-IO: they consume bytes and produce bytes plus
//! events, without caring where those bytes come from.  The `transport` and
//! `connection` modules put a network underneath them, with both a direct
//! TCP (optionally TLS) socket and an HTTP tunneled (RTMPT) variant.

extern crate base64;
extern crate byteorder;
extern crate bytes;
extern crate freshet_amf0;
extern crate md5;
extern crate native_tls;
extern crate parking_lot;
extern crate rand;
extern crate thiserror;
#[macro_use]
extern crate tracing;

#[cfg(test)]
#[macro_use]
mod test_utils;

pub mod auth;
pub mod chunk_io;
pub mod connection;
pub mod handshake;
pub mod messages;
pub mod muxer;
pub mod sessions;
pub mod shared_object;
pub mod time;
pub mod transport;
pub mod uri;
