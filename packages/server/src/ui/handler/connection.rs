//! Per-connection worker.
//!
//! Each accepted transport is driven through
//! `Handshaking -> Open -> Closing -> Closed` by its own task.

use std::{io, sync::Arc, time::Duration};

use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf},
    sync::watch,
};

use crate::{
    domain::{Connection, ConnectionId},
    infrastructure::protocol::{Frame, HandshakeLimits, frame_len, negotiate, parse_frame},
    ui::state::AppState,
    usecase::SendMessageError,
};
use hiroba_shared::time::get_jst_timestamp;

const READ_CHUNK_SIZE: usize = 4096;

/// Pause before retrying a read that failed with a transient error
const TRANSIENT_RETRY_DELAY: Duration = Duration::from_millis(10);

/// Bytes received but not yet parsed into frames
struct InboundBuffer {
    id: ConnectionId,
    bytes: Vec<u8>,
    /// Bytes of an oversized frame still to be thrown away as they arrive;
    /// `bytes` is empty while this is non-zero
    skip_remaining: u64,
    max_frame_bytes: usize,
}

impl InboundBuffer {
    fn new(id: ConnectionId, leftover: Vec<u8>, max_frame_bytes: usize) -> Self {
        Self {
            id,
            bytes: leftover,
            skip_remaining: 0,
            max_frame_bytes,
        }
    }

    fn extend(&mut self, data: &[u8]) {
        let skipped = self.skip_remaining.min(data.len() as u64) as usize;
        self.skip_remaining -= skipped as u64;
        self.bytes.extend_from_slice(&data[skipped..]);
    }

    /// Next complete frame, skipping frames that declare more than `max_frame_bytes`.
    fn next_frame(&mut self) -> Option<Frame> {
        loop {
            if self.skip_remaining > 0 {
                return None;
            }

            let Some(declared) = frame_len(&self.bytes) else {
                if self.bytes.len() > self.max_frame_bytes {
                    tracing::warn!(
                        "Connection {}: discarding {} unparseable bytes",
                        self.id,
                        self.bytes.len()
                    );
                    self.bytes.clear();
                }
                return None;
            };

            if declared > self.max_frame_bytes as u64 {
                tracing::warn!(
                    "Connection {}: discarding frame of {} bytes (limit {})",
                    self.id,
                    declared,
                    self.max_frame_bytes
                );
                let buffered = declared.min(self.bytes.len() as u64) as usize;
                self.bytes.drain(..buffered);
                self.skip_remaining = declared - buffered as u64;
                continue;
            }

            let (frame, consumed) = parse_frame(&self.bytes)?;
            self.bytes.drain(..consumed);
            return Some(frame);
        }
    }
}

enum ReadOutcome {
    Data(usize),
    Retry,
    Stop,
}

enum Phase<S> {
    Handshaking(S),
    Open {
        reader: ReadHalf<S>,
        connection: Connection,
        buffer: InboundBuffer,
    },
    /// `None` when the connection never got past the handshake
    Closing(Option<Connection>),
    Closed,
}

/// Drives one accepted transport from handshake to teardown
pub struct ConnectionWorker<S> {
    phase: Phase<S>,
    state: Arc<AppState>,
    running: watch::Receiver<bool>,
}

impl<S> ConnectionWorker<S>
where
    S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    /// # Arguments
    ///
    /// * `stream` - Freshly accepted transport
    /// * `state` - Shared relay state
    /// * `running` - Process-wide running flag; `false` stops the worker
    pub fn new(stream: S, state: Arc<AppState>, running: watch::Receiver<bool>) -> Self {
        Self {
            phase: Phase::Handshaking(stream),
            state,
            running,
        }
    }

    /// Run the worker to completion
    pub async fn run(mut self) {
        loop {
            let phase = std::mem::replace(&mut self.phase, Phase::Closed);
            self.phase = match phase {
                Phase::Handshaking(stream) => self.handshake(stream).await,
                Phase::Open {
                    mut reader,
                    connection,
                    mut buffer,
                } => {
                    self.read_loop(&mut reader, &connection, &mut buffer).await;
                    Phase::Closing(Some(connection))
                }
                Phase::Closing(connection) => {
                    self.close(connection).await;
                    Phase::Closed
                }
                Phase::Closed => return,
            };
        }
    }

    fn is_running(&self) -> bool {
        *self.running.borrow()
    }

    async fn handshake(&self, mut stream: S) -> Phase<S> {
        let upgraded = match negotiate(&mut stream, HandshakeLimits::from(&self.state.config)).await
        {
            Ok(upgraded) => upgraded,
            Err(e) => {
                tracing::warn!("Handshake failed: {}", e);
                let _ = stream.shutdown().await;
                return Phase::Closing(None);
            }
        };

        if !self.is_running() {
            let _ = stream.shutdown().await;
            return Phase::Closing(None);
        }

        let (reader, writer) = tokio::io::split(stream);
        let connection = Connection::new(
            self.state.id_factory.generate(),
            writer,
            get_jst_timestamp(),
        );

        match self
            .state
            .connect_participant_usecase
            .execute(connection.clone())
            .await
        {
            Ok(replayed) => {
                tracing::info!(
                    "Connection {} opened ({} message(s) replayed)",
                    connection.id(),
                    replayed
                );
                let buffer = InboundBuffer::new(
                    connection.id(),
                    upgraded.leftover,
                    self.state.config.max_frame_bytes,
                );
                Phase::Open {
                    reader,
                    connection,
                    buffer,
                }
            }
            Err(e) => {
                tracing::warn!("Connection {}: {}", connection.id(), e);
                Phase::Closing(Some(connection))
            }
        }
    }

    /// Returns once the peer is gone, the connection was closed elsewhere,
    /// or the relay is shutting down.
    async fn read_loop(
        &mut self,
        reader: &mut ReadHalf<S>,
        connection: &Connection,
        buffer: &mut InboundBuffer,
    ) {
        let mut chunk = [0u8; READ_CHUNK_SIZE];

        loop {
            if !self.is_running() {
                return;
            }

            self.relay_buffered(connection, buffer).await;

            let running = &mut self.running;
            let outcome = tokio::select! {
                read = reader.read(&mut chunk) => match read {
                    Ok(0) => {
                        tracing::debug!("Connection {} closed by peer", connection.id());
                        ReadOutcome::Stop
                    }
                    Ok(n) => ReadOutcome::Data(n),
                    Err(e) if is_transient(&e) => ReadOutcome::Retry,
                    Err(e) => {
                        tracing::debug!("Connection {} read error: {}", connection.id(), e);
                        ReadOutcome::Stop
                    }
                },
                _ = connection.closed() => ReadOutcome::Stop,
                _ = async {
                    let _ = running.wait_for(|running| !*running).await;
                } => ReadOutcome::Stop,
            };

            match outcome {
                ReadOutcome::Data(n) => buffer.extend(&chunk[..n]),
                ReadOutcome::Retry => tokio::time::sleep(TRANSIENT_RETRY_DELAY).await,
                ReadOutcome::Stop => return,
            }
        }
    }

    /// Relay every complete frame at the front of `buffer`.
    async fn relay_buffered(&self, connection: &Connection, buffer: &mut InboundBuffer) {
        while let Some(frame) = buffer.next_frame() {
            let Some(message) = frame.into_text() else {
                tracing::debug!("Connection {}: ignored non-text frame", connection.id());
                continue;
            };

            tracing::info!("Received from {}: {}", connection.id(), message);
            match self
                .state
                .send_message_usecase
                .execute(connection.id(), message)
                .await
            {
                Ok(report) => {
                    tracing::debug!(
                        "Relayed to {} connection(s), dropped {}",
                        report.delivered.len(),
                        report.dropped.len()
                    );
                }
                Err(SendMessageError::EmptyMessage) => {}
            }
        }
    }

    async fn close(&self, connection: Option<Connection>) {
        if let Some(connection) = connection {
            self.state
                .disconnect_participant_usecase
                .execute(&connection)
                .await;
            tracing::info!("Connection {} closed", connection.id());
        }
    }
}

fn is_transient(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}
