//! The filtering callback contract.

use crate::modifier::Modifier;
use crate::session::Headers;
use miltr_protocol::{Macros, NetworkKind, Response};

/// A `Milter` examines email messages and decides what to do with them.
///
/// The methods are called in order as the conversation with the MTA
/// proceeds: `connect`, `helo`, `mail_from`, `rcpt_to` (once per recipient),
/// `headers`, `body`. One instance handles one MTA connection, which may
/// carry several messages; in that case the flow jumps back to an earlier
/// point in the sequence.
///
/// Stages a filter has no interest in can be left to the default
/// implementations, which let the message continue.
///
/// `macros` carries extra, MTA-specific context declared for the command
/// being processed (queue id, authenticated user, ...).
pub trait Milter: Send {
    /// A new SMTP connection was received. `network` and `address` are in
    /// dial format: `host:port` for TCP, the socket path for unix sockets.
    fn connect(
        &mut self,
        hostname: &str,
        network: NetworkKind,
        address: &str,
        macros: &Macros,
    ) -> Response {
        let _ = (hostname, network, address, macros);
        Response::Continue
    }

    /// The client sent its HELO or EHLO message.
    fn helo(&mut self, name: &str, macros: &Macros) -> Response {
        let _ = (name, macros);
        Response::Continue
    }

    /// The client sent MAIL FROM. The sender address is passed without
    /// `<>` brackets.
    fn mail_from(&mut self, sender: &str, macros: &Macros) -> Response {
        let _ = (sender, macros);
        Response::Continue
    }

    /// The client sent RCPT TO. The recipient address is passed without
    /// `<>` brackets. A rejection response refuses only this recipient.
    fn rcpt_to(&mut self, recipient: &str, macros: &Macros) -> Response {
        let _ = (recipient, macros);
        Response::Continue
    }

    /// The message headers are complete.
    fn headers(&mut self, headers: &Headers) -> Response {
        let _ = headers;
        Response::Continue
    }

    /// The message body is complete. The modifier can alter the message
    /// before the MTA delivers it.
    fn body(&mut self, body: &[u8], modifier: &mut dyn Modifier) -> Response {
        let _ = (body, modifier);
        Response::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Uninterested;

    impl Milter for Uninterested {}

    #[test]
    fn default_implementations_continue() {
        let mut milter = Uninterested;
        let macros = Macros::new();

        assert_eq!(
            milter.connect("h", NetworkKind::Inet, "192.0.2.1:25", &macros),
            Response::Continue
        );
        assert_eq!(milter.helo("mx", &macros), Response::Continue);
        assert_eq!(milter.mail_from("a@b", &macros), Response::Continue);
        assert_eq!(milter.rcpt_to("c@d", &macros), Response::Continue);
        assert_eq!(milter.headers(&Headers::new()), Response::Continue);

        let mut sink = crate::modifier::ActionBuffer::new();
        assert_eq!(milter.body(b"data", &mut sink), Response::Continue);
        assert!(sink.is_empty());
    }
}
