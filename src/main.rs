//! circle-sketch: a split control/data-plane demo
//!
//! Two roles share one binary:
//! - `server`: accepts control connections on TCP and, on `start`, streams
//!   points tracing the unit circle over UDP
//! - `client`: asks the server for points, draws them as a polyline and
//!   writes the result as a PNG
//!
//! Features:
//! - Line-oriented control protocol (`HELLO`, `start`, `stop`, `bye`)
//! - One JSON point record per datagram
//! - Hierarchical cancellation; Ctrl-C shuts either side down cleanly
//! - Configuration via CLI arguments or TOML file

mod canvas;
mod client;
mod config;
mod emitter;
mod error;
mod net;
mod point;
mod protocol;
mod server;

use config::{Config, Mode};
use server::Server;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match config.mode.clone() {
        Mode::Server => run_server(config).await,
        Mode::Client { output } => run_client(config, output).await,
    };

    if let Err(e) = result {
        error!(error = %e, "Exiting on error");
        std::process::exit(1);
    }
}

/// Run the server until Ctrl-C
async fn run_server(config: Config) -> error::Result<()> {
    info!(
        control = %config.control_addr,
        data = %config.data_addr,
        tick = ?config.tick,
        max_connections = config.max_connections,
        "Starting circle-sketch server"
    );

    let server = Server::new(config);
    cancel_on_ctrl_c(server.shutdown_token());
    server.run().await
}

/// Run one client session
async fn run_client(config: Config, output: std::path::PathBuf) -> error::Result<()> {
    info!(
        control = %config.control_addr,
        data = %config.data_addr,
        session = ?config.session,
        output = %output.display(),
        "Starting circle-sketch client"
    );

    let shutdown = CancellationToken::new();
    cancel_on_ctrl_c(shutdown.clone());
    client::run(&config, output, shutdown).await
}

fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl-C, shutting down");
                token.cancel();
            }
            Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C"),
        }
    });
}
