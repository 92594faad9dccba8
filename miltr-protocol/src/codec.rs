//! Binary record codec.
//!
//! Every structured milter payload is a fixed-layout record built from four
//! field kinds: unsigned 8/16/32-bit big-endian integers and NUL-terminated
//! text. A record type declares its layout by implementing [`Record`]; nested
//! records recurse through their own impls. Field kinds outside this set are
//! unrepresentable, since the only way to touch the buffer is through the
//! typed readers and writers below.

use crate::error::ProtocolError;
use bytes::{BufMut, BytesMut};

/// Cursor over a record payload.
pub struct Decoder<'a> {
    data: &'a [u8],
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub fn read_u8(&mut self) -> Result<u8, ProtocolError> {
        let b = self.take(1)?;
        Ok(b[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, ProtocolError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, ProtocolError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Reads a text field up to its NUL terminator.
    ///
    /// Header and macro values may carry raw 8-bit data, so bytes that are
    /// not valid UTF-8 are replaced rather than rejected.
    pub fn read_text(&mut self) -> Result<String, ProtocolError> {
        let nul = self
            .data
            .iter()
            .position(|&b| b == 0)
            .ok_or(ProtocolError::UnterminatedText)?;
        let (text, rest) = self.data.split_at(nul);
        self.data = &rest[1..];
        Ok(String::from_utf8_lossy(text).into_owned())
    }

    /// Reads a nested record.
    pub fn read_record<T: Record>(&mut self) -> Result<T, ProtocolError> {
        T::decode(self)
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ProtocolError> {
        if self.data.len() < n {
            return Err(ProtocolError::InsufficientData {
                needed: n - self.data.len(),
            });
        }
        let (head, rest) = self.data.split_at(n);
        self.data = rest;
        Ok(head)
    }
}

/// Builder for a record payload.
#[derive(Default)]
pub struct Encoder {
    buf: BytesMut,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_u8(&mut self, v: u8) {
        self.buf.put_u8(v);
    }

    pub fn put_u16(&mut self, v: u16) {
        self.buf.put_u16(v);
    }

    pub fn put_u32(&mut self, v: u32) {
        self.buf.put_u32(v);
    }

    /// Writes a text field followed by its NUL terminator.
    pub fn put_text(&mut self, text: &str) {
        self.buf.put_slice(text.as_bytes());
        self.buf.put_u8(0);
    }

    /// Writes a nested record.
    pub fn put_record<T: Record>(&mut self, record: &T) {
        record.encode(self);
    }

    pub fn finish(self) -> BytesMut {
        self.buf
    }
}

/// A fixed-layout wire record.
///
/// `decode` consumes fields in declared order; `encode` writes them back in
/// the same order, so `decode(encode(r)) == r` for every valid record.
pub trait Record: Sized {
    fn decode(d: &mut Decoder<'_>) -> Result<Self, ProtocolError>;
    fn encode(&self, e: &mut Encoder);
}

/// Decodes a record from the start of `data`. Trailing bytes are ignored,
/// matching what MTAs put after the fields they promise.
pub fn decode<T: Record>(data: &[u8]) -> Result<T, ProtocolError> {
    T::decode(&mut Decoder::new(data))
}

/// Encodes a record into a fresh buffer.
pub fn encode<T: Record>(record: &T) -> BytesMut {
    let mut e = Encoder::new();
    record.encode(&mut e);
    e.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Inner {
        id: u16,
        label: String,
    }

    impl Record for Inner {
        fn decode(d: &mut Decoder<'_>) -> Result<Self, ProtocolError> {
            Ok(Self {
                id: d.read_u16()?,
                label: d.read_text()?,
            })
        }

        fn encode(&self, e: &mut Encoder) {
            e.put_u16(self.id);
            e.put_text(&self.label);
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Outer {
        kind: u8,
        inner: Inner,
        count: u32,
    }

    impl Record for Outer {
        fn decode(d: &mut Decoder<'_>) -> Result<Self, ProtocolError> {
            Ok(Self {
                kind: d.read_u8()?,
                inner: d.read_record()?,
                count: d.read_u32()?,
            })
        }

        fn encode(&self, e: &mut Encoder) {
            e.put_u8(self.kind);
            e.put_record(&self.inner);
            e.put_u32(self.count);
        }
    }

    #[test]
    fn integers_are_big_endian() {
        let mut d = Decoder::new(&[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07]);
        assert_eq!(d.read_u8().unwrap(), 0x01);
        assert_eq!(d.read_u16().unwrap(), 0x0203);
        assert_eq!(d.read_u32().unwrap(), 0x0405_0607);
        assert_eq!(d.remaining(), 0);
    }

    #[test]
    fn text_stops_at_nul() {
        let mut d = Decoder::new(b"mail.example.org\0rest\0");
        assert_eq!(d.read_text().unwrap(), "mail.example.org");
        assert_eq!(d.read_text().unwrap(), "rest");
        assert_eq!(d.remaining(), 0);
    }

    #[test]
    fn text_without_terminator_fails() {
        let mut d = Decoder::new(b"no terminator");
        assert!(matches!(
            d.read_text(),
            Err(ProtocolError::UnterminatedText)
        ));
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let mut d = Decoder::new(&[0x66, 0x6f, 0xff, 0x6f, 0x00]);
        let text = d.read_text().unwrap();
        assert_eq!(text, "fo\u{fffd}o");
    }

    #[test]
    fn short_fixed_width_field_reports_shortfall() {
        let mut d = Decoder::new(&[0x01]);
        assert!(matches!(
            d.read_u32(),
            Err(ProtocolError::InsufficientData { needed: 3 })
        ));
    }

    #[test]
    fn empty_buffer_reports_shortfall() {
        let mut d = Decoder::new(&[]);
        assert!(matches!(
            d.read_u8(),
            Err(ProtocolError::InsufficientData { needed: 1 })
        ));
    }

    #[test]
    fn nested_record_roundtrip() {
        let outer = Outer {
            kind: 7,
            inner: Inner {
                id: 512,
                label: "queue".to_string(),
            },
            count: 99_000,
        };
        let decoded: Outer = decode(&encode(&outer)).unwrap();
        assert_eq!(decoded, outer);
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let mut bytes = encode(&Inner {
            id: 1,
            label: "x".to_string(),
        });
        bytes.extend_from_slice(b"extra");
        let decoded: Inner = decode(&bytes).unwrap();
        assert_eq!(decoded.id, 1);
        assert_eq!(decoded.label, "x");
    }

    proptest! {
        #[test]
        fn record_roundtrip(kind: u8, id: u16, label in r"[^\x00]{0,64}", count: u32) {
            let outer = Outer {
                kind,
                inner: Inner { id, label },
                count,
            };
            let decoded: Outer = decode(&encode(&outer)).unwrap();
            prop_assert_eq!(decoded, outer);
        }

        #[test]
        fn text_roundtrip(text in r"[^\x00]{0,128}") {
            let mut e = Encoder::new();
            e.put_text(&text);
            let bytes = e.finish();
            let mut d = Decoder::new(&bytes);
            prop_assert_eq!(d.read_text().unwrap(), text);
            prop_assert_eq!(d.remaining(), 0);
        }
    }
}
