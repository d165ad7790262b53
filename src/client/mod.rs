//! Sketch client.
//!
//! Drives one session against the server:
//!
//! ```text
//! connect ──► HELLO ──► bind data port ──► start/OK
//!     ──► sketch for the session duration ──► cancel, save image
//!     ──► stop/OK ──► bye/OK ──► close
//! ```
//!
//! The receiver and the sketcher run as separate tasks joined by a bounded
//! point channel and share one cancellation token derived from the caller's.

pub mod control;
pub mod receiver;
pub mod sketcher;

use crate::canvas::Canvas;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::net::resolve;
use crate::protocol::Command;
use control::ControlClient;
use sketcher::Sketch;
use std::path::PathBuf;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Run one sketch session and write the result to `output`.
///
/// Cancelling `shutdown` cuts the session short; the image is still written
/// and the server is still told to stop.
pub async fn run(config: &Config, output: PathBuf, shutdown: CancellationToken) -> Result<()> {
    info!(server = %config.control_addr, "Starting TCP connection with server");
    let mut control = ControlClient::connect(&config.control_addr).await?;

    let data_addr = resolve(&config.data_addr).await?;
    let socket = UdpSocket::bind(data_addr)
        .await
        .map_err(|source| Error::Bind {
            addr: config.data_addr.clone(),
            source,
        })?;
    info!(address = %data_addr, "Listening for UDP packets");

    let cancel = shutdown.child_token();
    let _stop_tasks = cancel.clone().drop_guard();
    let (tx, rx) = mpsc::channel(config.channel_capacity);
    let mut receiver = tokio::spawn(receiver::receive(
        socket,
        tx,
        config.read_timeout,
        cancel.clone(),
    ));
    let sketcher = tokio::spawn(sketcher::sketch(
        Sketch::new(Canvas::with_scale(config.scale)),
        rx,
        output,
        cancel.clone(),
    ));

    info!("Telling server to start transmitting points");
    if let Err(e) = control.request(Command::Start).await {
        // Nothing sketched yet, so no image is written.
        receiver.abort();
        sketcher.abort();
        let _ = tokio::join!(receiver, sketcher);
        return Err(e);
    }

    let finished_early = tokio::select! {
        _ = tokio::time::sleep(config.session) => None,
        _ = shutdown.cancelled() => {
            info!("Interrupted, finishing sketch early");
            None
        }
        received = &mut receiver => Some(received),
    };

    cancel.cancel();
    sketcher.await??;

    let received = match finished_early {
        Some(received) => received,
        None => receiver.await,
    };
    if let Err(e) = received? {
        warn!(error = %e, "Receiver failed");
        return Err(e);
    }

    info!("Telling server to stop transmitting points");
    control.request(Command::Stop).await?;

    info!("Saying goodbye to server");
    control.request(Command::Bye).await?;
    control.close().await
}
