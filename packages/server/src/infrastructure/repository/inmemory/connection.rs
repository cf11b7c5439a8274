//! InMemory Connection Registry 実装

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Connection, ConnectionId, ConnectionRegistry};

/// インメモリ接続レジストリ
///
/// ConnectionId をキーに接続中のコネクションを保持します。
/// ロックは列挙のスナップショット取得の間だけ保持され、I/O 中には保持されません。
#[derive(Default)]
pub struct InMemoryConnectionRegistry {
    connections: Mutex<BTreeMap<ConnectionId, Connection>>,
}

impl InMemoryConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConnectionRegistry for InMemoryConnectionRegistry {
    async fn register(&self, connection: Connection) {
        let mut connections = self.connections.lock().await;
        let id = connection.id();
        connections.insert(id, connection);
        tracing::debug!("Connection {} registered ({} live)", id, connections.len());
    }

    async fn unregister(&self, id: ConnectionId) -> Option<Connection> {
        let mut connections = self.connections.lock().await;
        let removed = connections.remove(&id);
        if removed.is_some() {
            tracing::debug!("Connection {} unregistered ({} live)", id, connections.len());
        }
        removed
    }

    async fn targets_except(&self, id: ConnectionId) -> Vec<Connection> {
        let connections = self.connections.lock().await;
        connections
            .iter()
            .filter(|(connection_id, _)| **connection_id != id)
            .map(|(_, connection)| connection.clone())
            .collect()
    }

    async fn connections(&self) -> Vec<Connection> {
        let connections = self.connections.lock().await;
        connections.values().cloned().collect()
    }

    async fn count(&self) -> usize {
        let connections = self.connections.lock().await;
        connections.len()
    }

    async fn drain(&self) -> Vec<Connection> {
        let mut connections = self.connections.lock().await;
        std::mem::take(&mut *connections).into_values().collect()
    }
}
