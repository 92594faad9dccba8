//! miltrd - a diagnostic milter daemon.
//!
//! Accepts MTA connections and logs every protocol event without altering
//! or rejecting anything. Useful for checking MTA-side milter wiring before
//! a real filter goes in.

use clap::Parser;
use miltr::{Headers, Macros, Milter, Modifier, NetworkKind, Response};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "miltrd", version, about = "Logging milter daemon")]
struct Args {
    /// TCP address to listen on.
    #[arg(long, default_value = "127.0.0.1:7357")]
    listen: String,

    /// Unix socket path to listen on instead of TCP.
    #[cfg(unix)]
    #[arg(long)]
    unix_socket: Option<std::path::PathBuf>,
}

/// Logs each stage of the conversation and lets everything through.
struct LogMilter;

impl Milter for LogMilter {
    fn connect(
        &mut self,
        hostname: &str,
        network: NetworkKind,
        address: &str,
        macros: &Macros,
    ) -> Response {
        tracing::info!("connect: {} {} {} macros={:?}", hostname, network, address, macros);
        Response::Continue
    }

    fn helo(&mut self, name: &str, _macros: &Macros) -> Response {
        tracing::info!("helo: {}", name);
        Response::Continue
    }

    fn mail_from(&mut self, sender: &str, macros: &Macros) -> Response {
        tracing::info!("mail from: {} macros={:?}", sender, macros);
        Response::Continue
    }

    fn rcpt_to(&mut self, recipient: &str, _macros: &Macros) -> Response {
        tracing::info!("rcpt to: {}", recipient);
        Response::Continue
    }

    fn headers(&mut self, headers: &Headers) -> Response {
        tracing::info!("headers: {} lines", headers.len());
        for (name, value) in headers.iter() {
            tracing::debug!("  {}: {}", name, value);
        }
        Response::Continue
    }

    fn body(&mut self, body: &[u8], _modifier: &mut dyn Modifier) -> Response {
        tracing::info!("body: {} bytes", body.len());
        Response::Continue
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    #[cfg(unix)]
    if let Some(path) = args.unix_socket {
        let listener = tokio::net::UnixListener::bind(&path)?;
        tracing::info!("miltrd listening on {}", path.display());
        miltr::serve_unix(listener, || LogMilter).await?;
        return Ok(());
    }

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    tracing::info!("miltrd listening on {}", args.listen);
    miltr::serve(listener, || LogMilter).await?;
    Ok(())
}
