//! UseCase: リレー停止処理
//!
//! 全コネクションのトランスポートを閉じ（各ワーカーの読み込みが解除される）、
//! その後でレジストリと履歴を空にします。

use std::sync::Arc;

use futures_util::future::join_all;

use crate::domain::{ConnectionRegistry, HistoryRepository};

/// リレー停止のユースケース
pub struct ShutdownRelayUseCase {
    registry: Arc<dyn ConnectionRegistry>,
    history: Arc<dyn HistoryRepository>,
}

impl ShutdownRelayUseCase {
    pub fn new(registry: Arc<dyn ConnectionRegistry>, history: Arc<dyn HistoryRepository>) -> Self {
        Self { registry, history }
    }

    /// 停止処理を実行
    ///
    /// # Returns
    ///
    /// 閉じたコネクション数
    pub async fn execute(&self) -> usize {
        let connections = self.registry.drain().await;
        let closed = connections.len();
        join_all(connections.iter().map(|connection| connection.close())).await;

        self.history.clear().await;
        closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Connection, ConnectionId},
        infrastructure::repository::{InMemoryConnectionRegistry, InMemoryHistoryRepository},
    };

    #[tokio::test]
    async fn test_shutdown_closes_connections_and_clears_state() {
        // テスト項目: 停止時に全コネクションが閉じられ、レジストリと履歴が空になる
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let history = Arc::new(InMemoryHistoryRepository::new(100));
        history.append("m1".to_string()).await;
        let mut connections = Vec::new();
        let mut peers = Vec::new();
        for id in 1..=2 {
            let (server_side, client_side) = tokio::io::duplex(64);
            let connection = Connection::new(ConnectionId::new(id), server_side, 0);
            registry.register(connection.clone()).await;
            connections.push(connection);
            peers.push(client_side);
        }
        let usecase = ShutdownRelayUseCase::new(registry.clone(), history.clone());

        // when (操作):
        let closed = usecase.execute().await;

        // then (期待する結果):
        assert_eq!(closed, 2);
        assert!(connections.iter().all(|c| !c.is_open()));
        assert_eq!(registry.count().await, 0);
        assert!(history.snapshot().await.is_empty());
    }
}
