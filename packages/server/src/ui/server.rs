//! Server execution logic.

use std::{future::Future, io, net::SocketAddr, sync::Arc, time::Duration};

use thiserror::Error;
use tokio::{net::TcpListener, sync::watch};

use super::{
    handler::{ConnectionWorker, admin_router},
    state::AppState,
};

/// Pause after a failed `accept` (e.g. file descriptor exhaustion)
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Setup and runtime faults of the relay process
#[derive(Debug, Error)]
pub enum ServerError {
    /// The relay or admin listener could not be bound
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// WebSocket broadcast relay
///
/// # Example
///
/// ```ignore
/// let state = Arc::new(AppState::in_memory(ServerConfig::default()));
/// let server = Server::bind(state).await?;
/// server.run(shutdown_signal()).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
    relay_listener: TcpListener,
    relay_addr: SocketAddr,
    admin_listener: Option<(TcpListener, SocketAddr)>,
}

impl Server {
    /// Bind the relay listener, and the admin listener when an admin port is configured
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if either address cannot be bound.
    pub async fn bind(state: Arc<AppState>) -> Result<Self, ServerError> {
        let relay_listener = bind_listener(state.config.relay_addr()).await?;
        let relay_addr = relay_listener.local_addr()?;

        let admin_listener = match state.config.admin_addr() {
            Some(addr) => {
                let listener = bind_listener(addr).await?;
                let local_addr = listener.local_addr()?;
                Some((listener, local_addr))
            }
            None => None,
        };

        Ok(Self {
            state,
            relay_listener,
            relay_addr,
            admin_listener,
        })
    }

    /// Address the relay listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.relay_addr
    }

    /// Address of the admin API, if enabled
    pub fn admin_addr(&self) -> Option<SocketAddr> {
        self.admin_listener.as_ref().map(|(_, addr)| *addr)
    }

    /// Run the relay until `shutdown` resolves
    ///
    /// Every accepted connection gets its own detached worker. On shutdown the
    /// running flag is cleared, every registered transport is closed and the
    /// registry and history are emptied.
    pub async fn run<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send,
    {
        let Self {
            state,
            relay_listener,
            relay_addr,
            admin_listener,
        } = self;
        let (running_tx, running_rx) = watch::channel(true);

        tracing::info!("WebSocket relay listening on {}", relay_addr);
        tracing::info!("Connect to: ws://{}/", relay_addr);

        let admin_task = admin_listener.map(|(listener, addr)| {
            tracing::info!("Admin API listening on http://{}/api/health", addr);
            let app = admin_router(state.clone());
            let mut running = running_rx.clone();
            tokio::spawn(async move {
                axum::serve(listener, app)
                    .with_graceful_shutdown(async move {
                        let _ = running.wait_for(|running| !*running).await;
                    })
                    .await
            })
        });

        tracing::info!("Press Ctrl+C to shutdown gracefully");

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = relay_listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        tracing::debug!("Accepted connection from {}", peer);
                        let worker = ConnectionWorker::new(stream, state.clone(), running_rx.clone());
                        tokio::spawn(worker.run());
                    }
                    Err(e) => {
                        tracing::warn!("Failed to accept connection: {}", e);
                        tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                    }
                },
            }
        }

        // Stop accepting, then tear down every live connection
        drop(relay_listener);
        let _ = running_tx.send(false);
        let closed = state.shutdown_relay_usecase.execute().await;
        tracing::info!("Closed {} connection(s)", closed);

        if let Some(task) = admin_task {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!("Admin API stopped with error: {}", e),
                Err(e) => tracing::warn!("Admin API task failed: {}", e),
            }
        }

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}

async fn bind_listener(addr: String) -> Result<TcpListener, ServerError> {
    TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })
}
