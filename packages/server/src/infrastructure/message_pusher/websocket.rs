//! WebSocket フレームを使った MessagePusher 実装
//!
//! ## 責務
//!
//! - メッセージをテキストフレームにエンコード（ブロードキャストごとに 1 回）
//! - レジストリから取得した宛先への書き込み
//! - 書き込みに失敗した宛先の切断と登録解除
//!
//! レジストリのロックは宛先のスナップショット取得の間だけ保持され、
//! 書き込み中には保持されません。

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;

use crate::{
    domain::{
        BroadcastReport, Connection, ConnectionId, ConnectionRegistry, ConnectionWriterGuard,
        MessagePusher, PushError,
    },
    infrastructure::protocol::frame,
};

/// WebSocket を使った MessagePusher 実装
pub struct WebSocketMessagePusher {
    registry: Arc<dyn ConnectionRegistry>,
}

impl WebSocketMessagePusher {
    /// 新しい WebSocketMessagePusher を作成
    ///
    /// # 引数
    ///
    /// - `registry`: ブロードキャスト宛先を取得する接続レジストリ
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }

    async fn deliver(&self, target: Connection, frame: &[u8]) -> Result<ConnectionId, ConnectionId> {
        let id = target.id();
        match target.write_frame(frame).await {
            Ok(()) => Ok(id),
            Err(e) => {
                tracing::warn!("Dropping connection {} after failed broadcast: {}", id, e);
                target.close().await;
                self.registry.unregister(id).await;
                Err(id)
            }
        }
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn push_backlog(
        &self,
        writer: &mut ConnectionWriterGuard,
        messages: Vec<String>,
    ) -> Result<(), PushError> {
        for message in &messages {
            writer.write_frame(&frame::encode(message)).await?;
        }
        tracing::debug!(
            "Replayed {} messages to connection {}",
            messages.len(),
            writer.id()
        );
        Ok(())
    }

    async fn broadcast(&self, message: &str, origin: ConnectionId) -> BroadcastReport {
        let frame = frame::encode(message);
        let targets = self.registry.targets_except(origin).await;

        let outcomes = join_all(
            targets
                .into_iter()
                .map(|target| self.deliver(target, &frame)),
        )
        .await;

        let mut report = BroadcastReport::default();
        for outcome in outcomes {
            match outcome {
                Ok(id) => report.delivered.push(id),
                Err(id) => report.dropped.push(id),
            }
        }
        tracing::debug!(
            "Broadcast from connection {}: {} delivered, {} dropped",
            origin,
            report.delivered.len(),
            report.dropped.len()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, DuplexStream};

    use super::*;
    use crate::infrastructure::repository::InMemoryConnectionRegistry;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - broadcast: 送信元を除く全宛先への送信
    // - broadcast: 書き込み失敗した宛先だけが切断・登録解除されること
    // - push_backlog: 履歴が順番通りに送信されること
    //
    // 【なぜこのテストが必要か】
    // - 1 つの宛先の障害が他の宛先や送信元に波及しないことを保証する
    // ========================================

    async fn register(registry: &InMemoryConnectionRegistry, id: u64) -> (Connection, DuplexStream) {
        let (server_side, client_side) = tokio::io::duplex(64 * 1024);
        let connection = Connection::new(ConnectionId::new(id), server_side, 0);
        registry.register(connection.clone()).await;
        (connection, client_side)
    }

    async fn read_frame(client: &mut DuplexStream, expected: &[u8]) -> Vec<u8> {
        let mut buf = vec![0u8; expected.len()];
        tokio::time::timeout(Duration::from_secs(1), client.read_exact(&mut buf))
            .await
            .expect("frame should arrive")
            .unwrap();
        buf
    }

    async fn assert_nothing_received(client: &mut DuplexStream) {
        let mut buf = [0u8; 1];
        let result = tokio::time::timeout(Duration::from_millis(50), client.read(&mut buf)).await;
        assert!(result.is_err(), "no bytes should be received");
    }

    #[tokio::test]
    async fn test_broadcast_excludes_origin() {
        // テスト項目: A が送信したメッセージは B と C にだけ届く
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let (_a, mut client_a) = register(&registry, 1).await;
        let (_b, mut client_b) = register(&registry, 2).await;
        let (_c, mut client_c) = register(&registry, 3).await;
        let pusher = WebSocketMessagePusher::new(registry.clone());

        // when (操作):
        let report = pusher.broadcast("x", ConnectionId::new(1)).await;

        // then (期待する結果):
        let expected = frame::encode("x");
        assert_eq!(read_frame(&mut client_b, &expected).await, expected);
        assert_eq!(read_frame(&mut client_c, &expected).await, expected);
        assert_nothing_received(&mut client_a).await;
        assert_eq!(
            report.delivered,
            vec![ConnectionId::new(2), ConnectionId::new(3)]
        );
        assert!(report.dropped.is_empty());
    }

    #[tokio::test]
    async fn test_broadcast_drops_failed_recipient() {
        // テスト項目: 書き込みに失敗した宛先だけが登録解除され、他の宛先には届く
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let (_a, _client_a) = register(&registry, 1).await;
        let (b, client_b) = register(&registry, 2).await;
        let (_c, mut client_c) = register(&registry, 3).await;
        drop(client_b);
        let pusher = WebSocketMessagePusher::new(registry.clone());

        // when (操作):
        let report = pusher.broadcast("first", ConnectionId::new(1)).await;

        // then (期待する結果):
        assert_eq!(report.dropped, vec![ConnectionId::new(2)]);
        assert_eq!(report.delivered, vec![ConnectionId::new(3)]);
        assert!(!b.is_open());
        assert_eq!(registry.count().await, 2);
        let expected = frame::encode("first");
        assert_eq!(read_frame(&mut client_c, &expected).await, expected);

        // 以降のブロードキャストでは対象にならない
        let report = pusher.broadcast("second", ConnectionId::new(1)).await;
        assert_eq!(report.delivered, vec![ConnectionId::new(3)]);
        assert!(report.dropped.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_broadcast_drops_stalled_recipient() {
        // テスト項目: 受信しない宛先は書き込みタイムアウトで切断され、ブロードキャストは完了する
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let (_a, _client_a) = register(&registry, 1).await;
        let (stalled_side, _stalled_client) = tokio::io::duplex(16);
        let stalled = Connection::new(ConnectionId::new(2), stalled_side, 0);
        registry.register(stalled.clone()).await;
        let (_c, mut client_c) = register(&registry, 3).await;
        let pusher = WebSocketMessagePusher::new(registry.clone());
        let message = "y".repeat(100);

        // when (操作):
        let report = pusher.broadcast(&message, ConnectionId::new(1)).await;

        // then (期待する結果):
        assert_eq!(report.dropped, vec![ConnectionId::new(2)]);
        assert_eq!(report.delivered, vec![ConnectionId::new(3)]);
        assert!(!stalled.is_open());
        assert_eq!(registry.count().await, 2);
        let expected = frame::encode(&message);
        assert_eq!(read_frame(&mut client_c, &expected).await, expected);
    }

    #[tokio::test]
    async fn test_broadcast_with_no_other_connections() {
        // テスト項目: 送信元しかいない場合は誰にも送信されない
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let (_a, mut client_a) = register(&registry, 1).await;
        let pusher = WebSocketMessagePusher::new(registry.clone());

        // when (操作):
        let report = pusher.broadcast("alone", ConnectionId::new(1)).await;

        // then (期待する結果):
        assert_eq!(report, BroadcastReport::default());
        assert_nothing_received(&mut client_a).await;
    }

    #[tokio::test]
    async fn test_push_backlog_in_order() {
        // テスト項目: 履歴が古い順に 1 メッセージずつフレーム化されて届く
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let (connection, mut client) = register(&registry, 1).await;
        let pusher = WebSocketMessagePusher::new(registry.clone());
        let messages = vec!["m1".to_string(), "m2".to_string(), "m3".to_string()];

        // when (操作):
        let mut writer = connection.lock_writer().await;
        pusher.push_backlog(&mut writer, messages).await.unwrap();
        drop(writer);

        // then (期待する結果):
        let mut expected = frame::encode("m1");
        expected.extend(frame::encode("m2"));
        expected.extend(frame::encode("m3"));
        assert_eq!(read_frame(&mut client, &expected).await, expected);
    }
}
