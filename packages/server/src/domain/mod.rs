//! Domain layer: connection and history models plus the interfaces the
//! use cases depend on.

mod config;
mod connection;
mod error;
mod history;
mod message_pusher;
mod repository;

pub use config::{DEFAULT_HOST, DEFAULT_PORT, ServerConfig};
pub use connection::{
    Connection, ConnectionId, ConnectionIdFactory, ConnectionWriter, ConnectionWriterGuard,
};
pub use error::PushError;
pub use history::{DEFAULT_HISTORY_CAPACITY, MessageHistory};
pub use message_pusher::{BroadcastReport, MessagePusher};
pub use repository::{ConnectionRegistry, HistoryRepository};

#[cfg(test)]
pub use message_pusher::MockMessagePusher;
#[cfg(test)]
pub use repository::{MockConnectionRegistry, MockHistoryRepository};
