//! Domain errors.

use thiserror::Error;

use super::ConnectionId;

/// Failure to deliver a frame to one connection.
#[derive(Debug, Error)]
pub enum PushError {
    /// The connection was already closed by its worker or by a failed broadcast
    #[error("connection {0} is closed")]
    ConnectionClosed(ConnectionId),

    /// The recipient did not accept the frame in time
    #[error("write to connection {0} timed out")]
    Timeout(ConnectionId),

    /// Writing to the transport failed
    #[error("failed to write to connection {id}: {source}")]
    Io {
        id: ConnectionId,
        #[source]
        source: std::io::Error,
    },
}
