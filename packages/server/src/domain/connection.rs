//! Connection identity and the write side of an upgraded client channel.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use serde::Serialize;
use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    sync::{Mutex, Notify, OwnedMutexGuard},
};

use super::PushError;

/// Upper bound on waiting for an in-flight write before a transport is shut down.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Longest time a single frame write may take before the recipient counts as failed.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Write half of a client transport.
pub type ConnectionWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Identifier of one accepted connection.
///
/// Allocated monotonically by [`ConnectionIdFactory`], so an identifier is never
/// reused while the process is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generates generational connection identifiers.
#[derive(Debug)]
pub struct ConnectionIdFactory {
    next: AtomicU64,
}

impl ConnectionIdFactory {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    pub fn generate(&self) -> ConnectionId {
        ConnectionId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnectionIdFactory {
    fn default() -> Self {
        Self::new()
    }
}

/// One upgraded client channel as seen by the registry and the broadcaster.
///
/// Cloning is cheap; all clones share the same transport, liveness flag and
/// close notification. The read half is owned by the connection's worker.
#[derive(Clone)]
pub struct Connection {
    id: ConnectionId,
    connected_at: i64,
    writer: Arc<Mutex<ConnectionWriter>>,
    open: Arc<AtomicBool>,
    closed: Arc<Notify>,
}

impl Connection {
    /// Create a connection around the write half of an upgraded transport
    ///
    /// # Arguments
    ///
    /// * `id` - Identifier allocated for this connection
    /// * `writer` - Write half of the transport
    /// * `connected_at` - Unix timestamp of the successful handshake (milliseconds)
    pub fn new<W>(id: ConnectionId, writer: W, connected_at: i64) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            id,
            connected_at,
            writer: Arc::new(Mutex::new(Box::new(writer))),
            open: Arc::new(AtomicBool::new(true)),
            closed: Arc::new(Notify::new()),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn connected_at(&self) -> i64 {
        self.connected_at
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Take exclusive ownership of the write side.
    ///
    /// Other writers (broadcasts from other workers) wait until the guard is dropped,
    /// which lets a sequence of frames go out back to back.
    pub async fn lock_writer(&self) -> ConnectionWriterGuard {
        ConnectionWriterGuard {
            id: self.id,
            open: Arc::clone(&self.open),
            writer: Arc::clone(&self.writer).lock_owned().await,
        }
    }

    /// Write one complete frame.
    pub async fn write_frame(&self, frame: &[u8]) -> Result<(), PushError> {
        self.lock_writer().await.write_frame(frame).await
    }

    /// Mark the connection closed, wake its worker and shut the transport down.
    ///
    /// Safe to call more than once and from any task.
    pub async fn close(&self) {
        let was_open = self.open.swap(false, Ordering::AcqRel);
        if !was_open {
            return;
        }
        self.closed.notify_one();

        match tokio::time::timeout(CLOSE_TIMEOUT, Arc::clone(&self.writer).lock_owned()).await {
            Ok(writer) => shutdown_writer(self.id, writer).await,
            Err(_) => {
                // Writes are bounded by WRITE_TIMEOUT, so the holder lets go eventually
                tracing::debug!(
                    "Connection {} writer busy, shutting down once it is released",
                    self.id
                );
                let id = self.id;
                let writer = Arc::clone(&self.writer);
                tokio::spawn(async move {
                    shutdown_writer(id, writer.lock_owned().await).await;
                });
            }
        }
    }

    /// Resolves once [`Connection::close`] has been called.
    pub async fn closed(&self) {
        if !self.is_open() {
            return;
        }
        self.closed.notified().await;
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("connected_at", &self.connected_at)
            .field("open", &self.is_open())
            .finish()
    }
}

/// Exclusive write access to one connection, obtained via [`Connection::lock_writer`].
pub struct ConnectionWriterGuard {
    id: ConnectionId,
    open: Arc<AtomicBool>,
    writer: OwnedMutexGuard<ConnectionWriter>,
}

impl ConnectionWriterGuard {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Write every byte of `frame` and flush, or fail.
    pub async fn write_frame(&mut self, frame: &[u8]) -> Result<(), PushError> {
        if !self.open.load(Ordering::Acquire) {
            return Err(PushError::ConnectionClosed(self.id));
        }

        let id = self.id;
        let writer = &mut self.writer;
        let write = async {
            writer.write_all(frame).await?;
            writer.flush().await
        };
        tokio::time::timeout(WRITE_TIMEOUT, write)
            .await
            .map_err(|_| PushError::Timeout(id))?
            .map_err(|source| PushError::Io { id, source })
    }
}

async fn shutdown_writer(id: ConnectionId, mut writer: OwnedMutexGuard<ConnectionWriter>) {
    if let Err(e) = writer.shutdown().await {
        tracing::debug!("Shutdown of connection {} failed: {}", id, e);
    }
}
