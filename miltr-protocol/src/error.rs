//! Protocol error types.

use thiserror::Error;

/// Errors raised while framing or decoding milter packets.
///
/// Every variant except an unrecognized command tag (which is handled as a
/// soft warning upstream) is fatal to the connection that produced it.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("zero-length command packet")]
    EmptyCommand,

    #[error("packet too large: {size} bytes (max {max})")]
    PacketTooLarge { size: u32, max: u32 },

    #[error("stream ended mid-packet with {buffered} bytes pending")]
    Truncated { buffered: usize },

    #[error("not enough data: {needed} more bytes required")]
    InsufficientData { needed: usize },

    #[error("unterminated text field")]
    UnterminatedText,

    #[error("error decoding {command} record: {source}")]
    Decode {
        command: &'static str,
        #[source]
        source: Box<ProtocolError>,
    },

    #[error("macro-definition packet with no data")]
    EmptyMacros,

    #[error("{command} command with no address")]
    MissingAddress { command: &'static str },

    #[error("header packet with {tokens} fields (expected 2)")]
    MalformedHeader { tokens: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_context() {
        let err = ProtocolError::Decode {
            command: "connection info",
            source: Box::new(ProtocolError::UnterminatedText),
        };
        assert!(err.to_string().contains("connection info"));

        let err = ProtocolError::MissingAddress { command: "MAIL FROM" };
        assert!(err.to_string().contains("MAIL FROM"));

        let err = ProtocolError::PacketTooLarge {
            size: 2_000_000,
            max: 1_048_576,
        };
        assert!(err.to_string().contains("2000000"));
    }
}
