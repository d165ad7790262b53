//! Error types for circle-sketch

use std::time::Duration;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// circle-sketch error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Could not open the control connection
    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Could not bind a listener or socket
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Address resolved to nothing usable
    #[error("Address {0} did not resolve to any socket address")]
    Unresolved(String),

    /// Peer answered with something other than what the protocol requires
    #[error("Protocol violation: expected {expected:?}, got {actual:?}")]
    Protocol {
        expected: &'static str,
        actual: String,
    },

    /// Control line ran past the length limit without a newline
    #[error("Control line longer than {0} bytes")]
    LineTooLong(usize),

    /// Control channel closed while a reply was pending
    #[error("Control connection closed by peer")]
    Closed,

    /// Datagram did not hold a point record
    #[error("Malformed point record: {0}")]
    Decode(#[from] serde_json::Error),

    /// Point record with a coordinate outside `[-1, 1]`
    #[error("Point ({x}, {y}) is outside the unit square")]
    OutOfRange { x: f64, y: f64 },

    /// No datagram within the read deadline
    #[error("No datagram received within {0:?}")]
    ReadTimeout(Duration),

    /// Canvas could not be encoded
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Background task panicked or was aborted
    #[error("Task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Connection limiter was closed
    #[error("Connection limiter closed: {0}")]
    Acquire(#[from] tokio::sync::AcquireError),
}
