//! # miltr-server
//!
//! Connection handling for the milter protocol.
//!
//! This crate provides:
//! - The [`Milter`] callback contract filtering applications implement
//! - Per-connection session state (macros, headers, body)
//! - Command dispatch and response sequencing
//! - Mutation actions for the body phase ([`Modifier`])
//! - The accept loop and per-connection driver

pub mod error;
pub mod handler;
pub mod milter;
pub mod modifier;
pub mod server;
pub mod session;

pub use error::ServerError;
pub use handler::{dispatch, Flow};
pub use milter::Milter;
pub use modifier::{ActionBuffer, Modifier};
#[cfg(unix)]
pub use server::serve_unix;
pub use server::{handle_connection, serve};
pub use session::{Headers, Session};
