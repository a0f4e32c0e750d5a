//! CLI for wsrelay
//!
//! Loads configuration, binds the listener and relays until Ctrl-C.

use std::net::SocketAddr;
use std::process::ExitCode;

use chrono::{DateTime, Utc};
use clap::Parser;
use tracing::{error, info};
use wsrelay::config::load_config;
use wsrelay::connection::PUBLISHER_PATH;
use wsrelay::relay;
use wsrelay::stats::{STATS_INTERVAL, run_stats_observer};
use wsrelay::transport::{bind, serve};
use wsrelay::utils::error::RelayError;
use wsrelay::utils::logging;

#[derive(Parser)]
#[command(name = "wsrelay", about = "WebSocket fan-out relay")]
struct Cli {
    /// Host to listen on (overrides configuration)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides configuration)
    #[arg(long)]
    port: Option<u16>,

    /// Default log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Relay failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), RelayError> {
    let mut config = load_config()?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let listener = bind(&config.server.addr()).await?;
    let relay = relay::shared();
    print_banner(listener.local_addr()?, relay::lock(&relay).started_at());

    tokio::spawn(run_stats_observer(relay.clone(), STATS_INTERVAL));

    tokio::select! {
        _ = serve(listener, relay) => {
            error!("Relay server exited unexpectedly.");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Relay stopped.");
        }
    }

    Ok(())
}

fn print_banner(addr: SocketAddr, started_at: DateTime<Utc>) {
    info!("{}", "=".repeat(50));
    info!("  WebSocket fan-out relay");
    info!("{}", "=".repeat(50));
    info!("  Listening on ws://{addr}");
    info!("  Publisher path  : {PUBLISHER_PATH}");
    info!("  Subscriber path : / (any other path)");
    info!("  Started at      : {}", started_at.to_rfc3339());
    info!("{}", "=".repeat(50));
}
