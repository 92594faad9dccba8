//! Accept loop and per-connection driver.

use crate::error::ServerError;
use crate::handler::{self, Flow};
use crate::milter::Milter;
use crate::session::Session;
use bytes::BytesMut;
use miltr_protocol::{frame, ProtocolError};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;

/// Scratch buffer size for connection reads.
const READ_BUF_SIZE: usize = 8192;

/// Accepts MTA connections on `listener` and processes each with a fresh
/// filter from `new_milter`, one spawned task per connection. Runs until
/// the listener fails.
pub async fn serve<M, F>(listener: TcpListener, mut new_milter: F) -> Result<(), ServerError>
where
    M: Milter + 'static,
    F: FnMut() -> M,
{
    loop {
        let (stream, addr) = listener.accept().await?;
        tracing::info!("MTA connected: {}", addr);

        let milter = new_milter();
        tokio::spawn(async move {
            match handle_connection(stream, milter).await {
                Ok(()) => tracing::info!("MTA disconnected: {}", addr),
                Err(e) => tracing::error!("connection {} failed: {}", addr, e),
            }
        });
    }
}

/// Like [`serve`], for a unix socket listener.
#[cfg(unix)]
pub async fn serve_unix<M, F>(
    listener: tokio::net::UnixListener,
    mut new_milter: F,
) -> Result<(), ServerError>
where
    M: Milter + 'static,
    F: FnMut() -> M,
{
    loop {
        let (stream, addr) = listener.accept().await?;
        tracing::info!("MTA connected: {:?}", addr);

        let milter = new_milter();
        tokio::spawn(async move {
            match handle_connection(stream, milter).await {
                Ok(()) => tracing::info!("MTA disconnected: {:?}", addr),
                Err(e) => tracing::error!("connection {:?} failed: {}", addr, e),
            }
        });
    }
}

/// Drives one MTA conversation over `stream` until a quit command, a clean
/// end of stream, or an error.
///
/// Processing is strictly sequential: one command is decoded, dispatched
/// and answered before the next is looked at. Each outgoing packet is
/// written with a single `write_all` and flushed, so the MTA never sees a
/// partial packet.
pub async fn handle_connection<S, M>(mut stream: S, mut milter: M) -> Result<(), ServerError>
where
    S: AsyncRead + AsyncWrite + Unpin,
    M: Milter,
{
    let mut session = Session::new();
    let mut acc = BytesMut::with_capacity(READ_BUF_SIZE);
    let mut buf = [0u8; READ_BUF_SIZE];

    loop {
        while let Some(packet) = frame::decode(&mut acc)? {
            match handler::dispatch(&mut session, &mut milter, &packet)? {
                Flow::Respond(packets) => {
                    if packets.is_empty() {
                        continue;
                    }
                    for out in &packets {
                        stream.write_all(out).await?;
                    }
                    stream.flush().await?;
                }
                Flow::Quit => return Ok(()),
            }
        }

        let n = stream.read(&mut buf).await?;
        if n == 0 {
            if acc.is_empty() {
                // The MTA went away between packets.
                return Ok(());
            }
            return Err(ProtocolError::Truncated {
                buffered: acc.len(),
            }
            .into());
        }
        acc.extend_from_slice(&buf[..n]);
    }
}
