//! Mailgun management-API proxy.
//!
//! Forwards dashboard requests to the Mailgun API with per-account
//! credentials, retries flaky reads, fans out multi-event statistics and
//! answers with a uniform `{success, data | message, error}` envelope.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │                MAILGUN PROXY                 │
//!    Dashboard request   │  ┌────────┐   ┌──────────┐   ┌────────────┐  │
//!   ─────────────────────┼─▶│  http  │──▶│ handlers │──▶│credentials │  │
//!                        │  │ server │   └────┬─────┘   └────────────┘  │
//!                        │  └────────┘        │                         │
//!                        │                    ▼                         │
//!                        │            ┌──────────────┐                  │
//!                        │            │  resilience  │ retry / fan-out  │
//!                        │            └──────┬───────┘                  │
//!                        │                   ▼                          │
//!    Envelope response   │  ┌────────┐  ┌──────────┐                    │
//!   ◀────────────────────┼──│response│◀─│ upstream │◀───────────────────┼──── Mailgun API
//!                        │  └────────┘  └──────────┘                    │
//!                        └──────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use mailgun_proxy::config::load_config;
use mailgun_proxy::observability::{logging, metrics};
use mailgun_proxy::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "mailgun-proxy")]
#[command(about = "Mailgun management API proxy", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "MAILGUN_PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listener port.
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(port) = args.port {
        let mut addr: SocketAddr = config.listener.bind_address.parse()?;
        addr.set_port(port);
        config.listener.bind_address = addr.to_string();
    }

    logging::init_logging(&config.observability);
    tracing::info!("mailgun-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        upstream_timeout_ms = config.upstream.timeout_ms,
        accounts = config.accounts.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(shutdown.clone().trigger_on_signal());

    let server = HttpServer::new(config)?;
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
