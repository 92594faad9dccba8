//! # miltr-protocol
//!
//! Wire protocol for the milter interface, the channel through which an MTA
//! (sendmail, postfix) hands filtering decisions to an external process.
//!
//! This crate provides:
//! - Length-prefixed packet framing
//! - A binary record codec over big-endian integers and NUL-terminated text
//! - Command, response and mutation-action message types

pub mod codec;
pub mod error;
pub mod frame;
pub mod message;

pub use codec::{Decoder, Encoder, Record};
pub use error::ProtocolError;
pub use frame::MAX_PACKET_SIZE;
pub use message::{Command, ConnInfo, Macros, NetworkKind, OptNeg, Response};
