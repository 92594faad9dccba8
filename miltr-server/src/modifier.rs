//! Message mutation actions for the body phase.

use bytes::BytesMut;
use miltr_protocol::codec::{self, Encoder};
use miltr_protocol::frame;
use miltr_protocol::message::{
    ChangeHeaderRec, HeaderRec, ACTION_ADD_HEADER, ACTION_ADD_RCPT, ACTION_CHANGE_HEADER,
    ACTION_DELETE_RCPT, ACTION_REPLACE_BODY,
};

/// Mutations a filter may apply to the current message.
///
/// Only available while [`Milter::body`](crate::Milter::body) runs. Every
/// call becomes one action packet on the wire, in call order, ahead of the
/// body-phase response.
pub trait Modifier {
    /// Adds a recipient to the message.
    fn add_recipient(&mut self, recipient: &str);

    /// Removes a recipient from the message.
    fn delete_recipient(&mut self, recipient: &str);

    /// Replaces the message body.
    fn replace_body(&mut self, body: &[u8]);

    /// Adds a header.
    fn add_header(&mut self, name: &str, value: &str);

    /// Replaces an existing header. Since there can be multiple headers
    /// with the same name, `index` picks which one to change; the first
    /// header with that name is numbered 1, not 0. An empty value deletes
    /// the header.
    fn change_header(&mut self, name: &str, index: u32, value: &str);
}

/// Collects the action packets issued during one body callback.
///
/// The connection driver writes them out, in order, before the phase
/// response; a write failure there kills the connection before any
/// response can follow.
#[derive(Debug, Default)]
pub struct ActionBuffer {
    packets: Vec<BytesMut>,
}

impl ActionBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    /// The framed action packets, in the order they were issued.
    pub fn into_packets(self) -> Vec<BytesMut> {
        self.packets
    }

    fn push(&mut self, code: u8, payload: &[u8]) {
        self.packets.push(frame::encode(code, payload));
    }
}

impl Modifier for ActionBuffer {
    fn add_recipient(&mut self, recipient: &str) {
        let mut e = Encoder::new();
        e.put_text(&format!("<{recipient}>"));
        self.push(ACTION_ADD_RCPT, &e.finish());
    }

    fn delete_recipient(&mut self, recipient: &str) {
        let mut e = Encoder::new();
        e.put_text(&format!("<{recipient}>"));
        self.push(ACTION_DELETE_RCPT, &e.finish());
    }

    fn replace_body(&mut self, body: &[u8]) {
        self.push(ACTION_REPLACE_BODY, body);
    }

    fn add_header(&mut self, name: &str, value: &str) {
        let payload = codec::encode(&HeaderRec {
            name: name.to_string(),
            value: value.to_string(),
        });
        self.push(ACTION_ADD_HEADER, &payload);
    }

    fn change_header(&mut self, name: &str, index: u32, value: &str) {
        let payload = codec::encode(&ChangeHeaderRec {
            index,
            name: name.to_string(),
            value: value.to_string(),
        });
        self.push(ACTION_CHANGE_HEADER, &payload);
    }
}
