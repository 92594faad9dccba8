//! Command dispatch: the per-connection protocol engine.
//!
//! Dispatch is a pure, synchronous function over the session, the filter
//! and one decoded command; the connection driver in [`crate::server`] owns
//! all I/O. That keeps each command handler testable without a socket.

use crate::error::ServerError;
use crate::milter::Milter;
use crate::modifier::ActionBuffer;
use crate::session::Session;
use bytes::BytesMut;
use miltr_protocol::message::{Command, CMD_OPTNEG};
use miltr_protocol::{codec, frame, ProtocolError, Response};

/// What the connection driver does after one command has been handled.
#[derive(Debug)]
pub enum Flow {
    /// Write the packets (possibly none) and read the next command.
    Respond(Vec<BytesMut>),
    /// Tear the connection down cleanly.
    Quit,
}

/// Executes a single command packet against the session, invoking the
/// filter where the protocol calls for it.
pub fn dispatch(
    session: &mut Session,
    milter: &mut dyn Milter,
    packet: &[u8],
) -> Result<Flow, ServerError> {
    let Some(&tag) = packet.first() else {
        return Err(ProtocolError::EmptyCommand.into());
    };
    // Macros only apply to the one command type they were declared for.
    session.enter_command(tag);

    match Command::parse(packet)? {
        Command::OptNeg(mut opts) => {
            // Decline every optional protocol extension. The MTA then
            // expects an answer to each command it sends, which is exactly
            // what the dispatch table below produces.
            opts.protocol = 0;
            tracing::debug!(
                "negotiated options: version={} actions={:#x}",
                opts.version,
                opts.actions
            );
            Ok(Flow::Respond(vec![frame::encode(
                CMD_OPTNEG,
                &codec::encode(&opts),
            )]))
        }
        Command::DefineMacros { target, macros } => {
            session.define_macros(target, macros);
            Ok(Flow::Respond(Vec::new()))
        }
        Command::Abort => {
            session.abort();
            Ok(Flow::Respond(Vec::new()))
        }
        Command::Quit => Ok(Flow::Quit),
        Command::Connect(info) => {
            let response = milter.connect(
                &info.hostname,
                info.network(),
                &info.dial_address(),
                session.macros(),
            );
            Ok(respond(response))
        }
        Command::Helo(name) => Ok(respond(milter.helo(&name, session.macros()))),
        Command::MailFrom(sender) => Ok(respond(milter.mail_from(&sender, session.macros()))),
        Command::RcptTo(recipient) => Ok(respond(milter.rcpt_to(&recipient, session.macros()))),
        // DATA carries nothing the callback contract needs.
        Command::Data => Ok(respond(Response::Continue)),
        Command::Header { name, value } => {
            session.add_header(name, value);
            Ok(respond(Response::Continue))
        }
        Command::EndOfHeaders => {
            let headers = session.take_headers();
            Ok(respond(milter.headers(&headers)))
        }
        Command::BodyChunk(chunk) => {
            session.append_body(&chunk);
            Ok(respond(Response::Continue))
        }
        Command::EndOfBody => {
            let body = session.take_body();
            let mut actions = ActionBuffer::new();
            let response = milter.body(&body, &mut actions);
            let mut packets = actions.into_packets();
            let (code, data) = response.to_wire();
            packets.push(frame::encode(code, &data));
            Ok(Flow::Respond(packets))
        }
        Command::Unknown(code) => {
            tracing::warn!("unrecognized command code: {:?}", char::from(code));
            Ok(respond(Response::Continue))
        }
    }
}

fn respond(response: Response) -> Flow {
    let (code, data) = response.to_wire();
    Flow::Respond(vec![frame::encode(code, &data)])
}
