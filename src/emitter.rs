//! Data plane producer.
//!
//! An emitter samples the circle once per tick and sends each sample as one
//! datagram to a fixed destination until its cancellation token fires.

use crate::error::Result;
use crate::point::position;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// A background data plane producer bound to one destination.
pub struct Emitter {
    socket: UdpSocket,
    dest: SocketAddr,
    tick: Duration,
}

impl Emitter {
    /// Open a sender on an ephemeral local port of the same address family
    /// as `dest`. The socket is left unconnected so that a missing listener
    /// does not surface as a send error.
    pub async fn open(dest: SocketAddr, tick: Duration) -> Result<Self> {
        let local = if dest.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        };
        let socket = UdpSocket::bind(local).await?;
        Ok(Emitter { socket, dest, tick })
    }

    /// Emit points until `cancel` fires.
    ///
    /// Elapsed time is measured from the moment this is called, so every
    /// emitter starts at `(1, 0)`. The socket is closed on return.
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        let start = Instant::now();
        let mut ticker = interval_at(start + self.tick, self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        debug!(dest = %self.dest, tick = ?self.tick, "Emitter running");

        let mut sent: u64 = 0;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(dest = %self.dest, sent, "Emitter cancelled");
                    return Ok(());
                }
                now = ticker.tick() => {
                    let point = position(now - start);
                    let payload = point.encode();
                    if let Err(e) = self.socket.send_to(&payload, self.dest).await {
                        if cancel.is_cancelled() {
                            return Ok(());
                        }
                        return Err(e.into());
                    }
                    sent += 1;
                    trace!(x = point.x, y = point.y, "Sent point");
                }
            }
        }
    }
}
