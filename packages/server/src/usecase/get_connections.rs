//! UseCase: 接続一覧取得

use std::sync::Arc;

use crate::domain::{Connection, ConnectionRegistry};

/// 接続一覧取得のユースケース
pub struct GetConnectionsUseCase {
    registry: Arc<dyn ConnectionRegistry>,
}

impl GetConnectionsUseCase {
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// 接続中のコネクションを ID 順に取得
    pub async fn execute(&self) -> Vec<Connection> {
        let mut connections = self.registry.connections().await;
        connections.sort_by_key(Connection::id);
        connections
    }

    /// 接続中のコネクション数を取得
    pub async fn count(&self) -> usize {
        self.registry.count().await
    }
}
