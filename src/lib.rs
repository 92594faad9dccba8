//! Framework for writing milters (mail filters) for sendmail and postfix.
//!
//! A milter is an external process the MTA consults while a message is in
//! flight: at connect, HELO, envelope, header and body time it asks the
//! filter what to do, and during the body phase the filter may also rewrite
//! recipients, headers or the body itself.
//!
//! To implement one, make a type that implements [`Milter`], bind a TCP or
//! unix socket, and hand the listener to [`serve`] together with a factory
//! that produces one filter instance per MTA connection:
//!
//! ```no_run
//! use miltr::{Macros, Milter, Response};
//!
//! struct RejectSpam;
//!
//! impl Milter for RejectSpam {
//!     fn mail_from(&mut self, sender: &str, _macros: &Macros) -> Response {
//!         if sender.ends_with("@spam.example") {
//!             Response::Reject
//!         } else {
//!             Response::Continue
//!         }
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), miltr::ServerError> {
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:7357").await?;
//!     miltr::serve(listener, || RejectSpam).await
//! }
//! ```
//!
//! Wire-level pieces (framing, the record codec, message types) live in
//! [`protocol`]; connection handling and the callback contract live in
//! [`server`].

pub use miltr_protocol as protocol;
pub use miltr_server as server;

pub use miltr_protocol::{Macros, NetworkKind, ProtocolError, Response};
#[cfg(unix)]
pub use miltr_server::serve_unix;
pub use miltr_server::{
    handle_connection, serve, ActionBuffer, Headers, Milter, Modifier, ServerError,
};
