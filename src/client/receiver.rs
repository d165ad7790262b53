//! Data plane consumer.

use crate::error::{Error, Result};
use crate::point::Point;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Largest point record we accept
const DATAGRAM_SIZE: usize = 1024;

/// Forward points from `socket` to `points` until `cancel` fires.
///
/// Each read waits at most `read_timeout`. A silent peer, a malformed or
/// out-of-range datagram, or a socket error ends the receiver with an error.
/// Returning, for any reason, drops `points` and so closes the channel.
pub async fn receive(
    socket: UdpSocket,
    points: mpsc::Sender<Point>,
    read_timeout: Duration,
    cancel: CancellationToken,
) -> Result<()> {
    let mut buf = [0u8; DATAGRAM_SIZE];
    let mut received: u64 = 0;

    loop {
        let n = tokio::select! {
            _ = cancel.cancelled() => break,
            read = tokio::time::timeout(read_timeout, socket.recv_from(&mut buf)) => {
                match read {
                    Ok(Ok((n, _))) => n,
                    Ok(Err(e)) => return Err(e.into()),
                    Err(_) => return Err(Error::ReadTimeout(read_timeout)),
                }
            }
        };
        if n == 0 {
            continue;
        }

        let point = Point::decode(&buf[..n])?;
        trace!(x = point.x, y = point.y, "Received point");

        tokio::select! {
            _ = cancel.cancelled() => break,
            sent = points.send(point) => {
                if sent.is_err() {
                    debug!("Sketcher gone, receiver stopping");
                    break;
                }
            }
        }
        received += 1;
    }

    debug!(received, "Receiver finished");
    Ok(())
}
