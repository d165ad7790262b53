//! Endpoint resolution shared by both sides.

use crate::error::{Error, Result};
use std::net::SocketAddr;
use tokio::net::lookup_host;

/// Resolve `host:port`, preferring an IPv4 address.
///
/// `localhost` commonly resolves to both `127.0.0.1` and `::1`; the server's
/// sender and the client's listener must pick the same one.
pub async fn resolve(addr: &str) -> Result<SocketAddr> {
    let addrs: Vec<SocketAddr> = lookup_host(addr).await?.collect();
    addrs
        .iter()
        .find(|a| a.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
        .ok_or_else(|| Error::Unresolved(addr.to_string()))
}
