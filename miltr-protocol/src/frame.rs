//! Length-prefixed packet framing.
//!
//! Wire packet layout:
//!
//! ```text
//! +-----------+-------------------+
//! | length    | payload           |
//! | 4 bytes   | `length` bytes    |
//! +-----------+-------------------+
//! ```
//!
//! The length is big-endian and counts only the payload. Commands arrive as
//! a tag byte followed by command data; responses and mutation actions leave
//! as a status byte followed by response data, so the prefix of an outgoing
//! packet covers `data.len() + 1`.

use crate::error::ProtocolError;
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Size of the length prefix in bytes.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Upper bound on a single packet payload. MTAs chunk message bodies well
/// below this; anything larger is a corrupt or hostile length prefix.
pub const MAX_PACKET_SIZE: u32 = 1024 * 1024;

/// Decodes one packet from `buf`, consuming it.
///
/// Returns `Ok(Some(payload))` for a complete packet, `Ok(None)` when the
/// buffer holds less than a whole packet, or an error for a zero-length or
/// oversized packet. Nothing is consumed until a whole packet is available,
/// so the caller can keep appending reads to the same buffer.
pub fn decode(buf: &mut BytesMut) -> Result<Option<Bytes>, ProtocolError> {
    if buf.len() < LENGTH_PREFIX_SIZE {
        return Ok(None);
    }

    let length = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
    if length == 0 {
        return Err(ProtocolError::EmptyCommand);
    }
    if length > MAX_PACKET_SIZE {
        return Err(ProtocolError::PacketTooLarge {
            size: length,
            max: MAX_PACKET_SIZE,
        });
    }

    let total = LENGTH_PREFIX_SIZE + length as usize;
    if buf.len() < total {
        return Ok(None);
    }

    buf.advance(LENGTH_PREFIX_SIZE);
    Ok(Some(buf.split_to(length as usize).freeze()))
}

/// Encodes a response or mutation-action packet.
///
/// The result is one contiguous buffer, written with a single `write_all`
/// so the peer never observes a partial packet.
pub fn encode(code: u8, data: &[u8]) -> BytesMut {
    let mut buf = BytesMut::with_capacity(LENGTH_PREFIX_SIZE + 1 + data.len());
    buf.put_u32(data.len() as u32 + 1);
    buf.put_u8(code);
    buf.put_slice(data);
    buf
}
