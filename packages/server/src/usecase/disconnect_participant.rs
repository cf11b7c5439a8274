//! UseCase: 参加者切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() メソッド
//! - 登録解除とトランスポートの解放
//!
//! ### なぜこのテストが必要か
//! - 読み込みループの終了とブロードキャスト失敗の両方から呼ばれるため、冪等である必要がある
//!
//! ### どのような状況を想定しているか
//! - 正常系：登録済みコネクションの切断
//! - エッジケース：既に登録解除済みのコネクションの切断

use std::sync::Arc;

use crate::domain::{Connection, ConnectionRegistry};

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase {
    /// 接続レジストリ
    registry: Arc<dyn ConnectionRegistry>,
}

impl DisconnectParticipantUseCase {
    /// 新しい DisconnectParticipantUseCase を作成
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// 参加者切断を実行
    ///
    /// # Returns
    ///
    /// `true` if the connection was still registered
    pub async fn execute(&self, connection: &Connection) -> bool {
        // 1. レジストリから登録解除
        let was_registered = self.registry.unregister(connection.id()).await.is_some();

        // 2. トランスポートを閉じる
        connection.close().await;

        was_registered
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncReadExt;

    use super::*;
    use crate::{domain::ConnectionId, infrastructure::repository::InMemoryConnectionRegistry};

    #[tokio::test]
    async fn test_disconnect_unregisters_and_closes() {
        // テスト項目: 切断すると登録解除され、相手側は EOF を受け取る
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let (server_side, mut client_side) = tokio::io::duplex(1024);
        let connection = Connection::new(ConnectionId::new(1), server_side, 0);
        registry.register(connection.clone()).await;
        let usecase = DisconnectParticipantUseCase::new(registry.clone());

        // when (操作):
        let was_registered = usecase.execute(&connection).await;

        // then (期待する結果):
        assert!(was_registered);
        assert_eq!(registry.count().await, 0);
        assert!(!connection.is_open());
        let mut buf = Vec::new();
        assert_eq!(client_side.read_to_end(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_disconnect_twice_is_noop() {
        // テスト項目: 既に切断済みのコネクションを再度切断しても問題ない（冪等性）
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let (server_side, _client_side) = tokio::io::duplex(1024);
        let connection = Connection::new(ConnectionId::new(1), server_side, 0);
        registry.register(connection.clone()).await;
        let usecase = DisconnectParticipantUseCase::new(registry.clone());
        usecase.execute(&connection).await;

        // when (操作):
        let was_registered = usecase.execute(&connection).await;

        // then (期待する結果):
        assert!(!was_registered);
        assert_eq!(registry.count().await, 0);
    }
}
