//! Command, response and mutation-action message types.

use crate::codec::{Decoder, Encoder, Record};
use crate::error::ProtocolError;
use bytes::Bytes;
use std::collections::HashMap;
use std::fmt;

/// Extra, MTA-specific context supplied ahead of a specific command type.
/// If the MTA sent a macro name enclosed in curly braces, they have been
/// removed.
pub type Macros = HashMap<String, String>;

// Command codes sent by the MTA.
pub const CMD_OPTNEG: u8 = b'O';
pub const CMD_MACRO: u8 = b'D';
pub const CMD_ABORT: u8 = b'A';
pub const CMD_QUIT: u8 = b'Q';
pub const CMD_CONNECT: u8 = b'C';
pub const CMD_HELO: u8 = b'H';
pub const CMD_MAIL: u8 = b'M';
pub const CMD_RCPT: u8 = b'R';
pub const CMD_DATA: u8 = b'T';
pub const CMD_HEADER: u8 = b'L';
pub const CMD_END_HEADERS: u8 = b'N';
pub const CMD_BODY: u8 = b'B';
pub const CMD_END_BODY: u8 = b'E';

// Response status codes written back to the MTA.
pub const RESP_ACCEPT: u8 = b'a';
pub const RESP_CONTINUE: u8 = b'c';
pub const RESP_DISCARD: u8 = b'd';
pub const RESP_REJECT: u8 = b'r';
pub const RESP_TEMPFAIL: u8 = b't';
pub const RESP_CUSTOM: u8 = b'y';

// Mutation action codes, written during the body phase.
pub const ACTION_ADD_RCPT: u8 = b'+';
pub const ACTION_DELETE_RCPT: u8 = b'-';
pub const ACTION_REPLACE_BODY: u8 = b'b';
pub const ACTION_ADD_HEADER: u8 = b'h';
pub const ACTION_CHANGE_HEADER: u8 = b'm';

/// One command packet, decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Capability negotiation at session start.
    OptNeg(OptNeg),
    /// Macro batch for an upcoming command of type `target`.
    DefineMacros { target: u8, macros: Macros },
    /// The current message or recipient was cancelled mid-transaction.
    Abort,
    /// Connection teardown.
    Quit,
    /// A new SMTP connection was observed.
    Connect(ConnInfo),
    /// The client's HELO/EHLO hostname.
    Helo(String),
    /// MAIL FROM, sender without `<>` brackets.
    MailFrom(String),
    /// RCPT TO, recipient without `<>` brackets.
    RcptTo(String),
    /// DATA was observed. Carries nothing and triggers nothing.
    Data,
    /// One header line.
    Header { name: String, value: String },
    /// The message headers are complete.
    EndOfHeaders,
    /// A chunk of the message body.
    BodyChunk(Bytes),
    /// The message body is complete.
    EndOfBody,
    /// A command code this implementation does not recognize.
    Unknown(u8),
}

impl Command {
    /// Parses one command packet: a tag byte followed by the payload.
    pub fn parse(packet: &[u8]) -> Result<Self, ProtocolError> {
        let (&tag, payload) = packet.split_first().ok_or(ProtocolError::EmptyCommand)?;

        match tag {
            CMD_OPTNEG => Ok(Command::OptNeg(decode_payload("option negotiation", payload)?)),
            CMD_MACRO => parse_macros(payload),
            CMD_ABORT => Ok(Command::Abort),
            CMD_QUIT => Ok(Command::Quit),
            CMD_CONNECT => Ok(Command::Connect(decode_payload("connection info", payload)?)),
            CMD_HELO => {
                let name = payload.strip_suffix(&[0]).unwrap_or(payload);
                Ok(Command::Helo(String::from_utf8_lossy(name).into_owned()))
            }
            CMD_MAIL => Ok(Command::MailFrom(parse_address(payload, "MAIL FROM")?)),
            CMD_RCPT => Ok(Command::RcptTo(parse_address(payload, "RCPT TO")?)),
            CMD_DATA => Ok(Command::Data),
            CMD_HEADER => {
                let tokens = split_cstrings(payload);
                match <[String; 2]>::try_from(tokens) {
                    Ok([name, value]) => Ok(Command::Header { name, value }),
                    Err(tokens) => Err(ProtocolError::MalformedHeader {
                        tokens: tokens.len(),
                    }),
                }
            }
            CMD_END_HEADERS => Ok(Command::EndOfHeaders),
            CMD_BODY => Ok(Command::BodyChunk(Bytes::copy_from_slice(payload))),
            CMD_END_BODY => Ok(Command::EndOfBody),
            other => Ok(Command::Unknown(other)),
        }
    }
}

fn decode_payload<T: Record>(command: &'static str, payload: &[u8]) -> Result<T, ProtocolError> {
    crate::codec::decode(payload).map_err(|source| ProtocolError::Decode {
        command,
        source: Box::new(source),
    })
}

fn parse_macros(payload: &[u8]) -> Result<Command, ProtocolError> {
    let (&target, rest) = payload.split_first().ok_or(ProtocolError::EmptyMacros)?;

    let tokens = split_cstrings(rest);
    let mut macros = Macros::new();
    for pair in tokens.chunks_exact(2) {
        macros.insert(
            strip_brackets(&pair[0], b'{', b'}').to_string(),
            pair[1].clone(),
        );
    }
    Ok(Command::DefineMacros { target, macros })
}

fn parse_address(payload: &[u8], command: &'static str) -> Result<String, ProtocolError> {
    let args = split_cstrings(payload);
    let first = args
        .first()
        .ok_or(ProtocolError::MissingAddress { command })?;
    Ok(strip_brackets(first, b'<', b'>').to_string())
}

/// Splits a buffer of NUL-terminated strings. One trailing NUL does not
/// count as an empty final string; an empty buffer holds no strings.
fn split_cstrings(data: &[u8]) -> Vec<String> {
    if data.is_empty() {
        return Vec::new();
    }
    let data = data.strip_suffix(&[0]).unwrap_or(data);
    data.split(|&b| b == 0)
        .map(|s| String::from_utf8_lossy(s).into_owned())
        .collect()
}

/// Returns `s` without its surrounding brackets if it is enclosed in the
/// given pair. A lone bracket, or the bare pair `<>`, is left untouched.
fn strip_brackets(s: &str, open: u8, close: u8) -> &str {
    let bytes = s.as_bytes();
    if bytes.len() > 2 && bytes[0] == open && bytes[bytes.len() - 1] == close {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

/// Option-negotiation record exchanged at session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptNeg {
    pub version: u32,
    pub actions: u32,
    pub protocol: u32,
}

impl Record for OptNeg {
    fn decode(d: &mut Decoder<'_>) -> Result<Self, ProtocolError> {
        Ok(Self {
            version: d.read_u32()?,
            actions: d.read_u32()?,
            protocol: d.read_u32()?,
        })
    }

    fn encode(&self, e: &mut Encoder) {
        e.put_u32(self.version);
        e.put_u32(self.actions);
        e.put_u32(self.protocol);
    }
}

/// Connection-information record carried by the connect command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnInfo {
    pub hostname: String,
    pub family: u8,
    pub port: u16,
    pub address: String,
}

impl ConnInfo {
    /// Network kind for the protocol-family byte.
    pub fn network(&self) -> NetworkKind {
        match self.family {
            b'L' => NetworkKind::Unix,
            b'4' => NetworkKind::Inet,
            b'6' => NetworkKind::Inet6,
            other => NetworkKind::Unknown(other),
        }
    }

    /// Dial-style address: the socket path for unix sockets, `host:port`
    /// for IPv4, `[host]:port` for IPv6. Empty for unknown families.
    pub fn dial_address(&self) -> String {
        match self.network() {
            NetworkKind::Unix => self.address.clone(),
            NetworkKind::Inet | NetworkKind::Inet6 => join_host_port(&self.address, self.port),
            NetworkKind::Unknown(_) => String::new(),
        }
    }
}

impl Record for ConnInfo {
    fn decode(d: &mut Decoder<'_>) -> Result<Self, ProtocolError> {
        Ok(Self {
            hostname: d.read_text()?,
            family: d.read_u8()?,
            port: d.read_u16()?,
            address: d.read_text()?,
        })
    }

    fn encode(&self, e: &mut Encoder) {
        e.put_text(&self.hostname);
        e.put_u8(self.family);
        e.put_u16(self.port);
        e.put_text(&self.address);
    }
}

fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

/// The transport family an SMTP client connected over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkKind {
    Unix,
    Inet,
    Inet6,
    Unknown(u8),
}

impl NetworkKind {
    /// The name dial-style APIs use for this family.
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkKind::Unix => "unix",
            NetworkKind::Inet => "tcp4",
            NetworkKind::Inet6 => "tcp6",
            NetworkKind::Unknown(_) => "",
        }
    }
}

impl fmt::Display for NetworkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name/value payload for the add-header action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRec {
    pub name: String,
    pub value: String,
}

impl Record for HeaderRec {
    fn decode(d: &mut Decoder<'_>) -> Result<Self, ProtocolError> {
        Ok(Self {
            name: d.read_text()?,
            value: d.read_text()?,
        })
    }

    fn encode(&self, e: &mut Encoder) {
        e.put_text(&self.name);
        e.put_text(&self.value);
    }
}

/// Payload for the change-header action. `index` is 1-based and selects
/// among headers sharing the same name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeHeaderRec {
    pub index: u32,
    pub name: String,
    pub value: String,
}

impl Record for ChangeHeaderRec {
    fn decode(d: &mut Decoder<'_>) -> Result<Self, ProtocolError> {
        Ok(Self {
            index: d.read_u32()?,
            name: d.read_text()?,
            value: d.read_text()?,
        })
    }

    fn encode(&self, e: &mut Encoder) {
        e.put_u32(self.index);
        e.put_text(&self.name);
        e.put_text(&self.value);
    }
}

/// What to do with a message or recipient.
///
/// Filter callbacks that have no opinion should return [`Response::Continue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Accept and deliver the message with no further processing.
    Accept,
    /// Keep processing the message.
    Continue,
    /// Silently discard the message, without an error to the sender.
    Discard,
    /// Reject the message or recipient with a permanent (5xx) error.
    Reject,
    /// Reject the message or recipient with a temporary (4xx) error.
    TempFail,
    /// Respond with a custom SMTP status code and message.
    Custom { code: u16, message: String },
}

impl Response {
    /// Status byte and payload for the wire.
    pub fn to_wire(&self) -> (u8, Vec<u8>) {
        match self {
            Response::Accept => (RESP_ACCEPT, Vec::new()),
            Response::Continue => (RESP_CONTINUE, Vec::new()),
            Response::Discard => (RESP_DISCARD, Vec::new()),
            Response::Reject => (RESP_REJECT, Vec::new()),
            Response::TempFail => (RESP_TEMPFAIL, Vec::new()),
            Response::Custom { code, message } => {
                let mut data = format!("{code} {message}").into_bytes();
                data.push(0);
                (RESP_CUSTOM, data)
            }
        }
    }
}
