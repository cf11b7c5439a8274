//! UseCase: メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - 履歴への追加とブロードキャストの順序
//!
//! ### なぜこのテストが必要か
//! - 空メッセージは履歴にもブロードキャストにも流れてはいけない
//! - 送信元はブロードキャストから除外される
//!
//! ### どのような状況を想定しているか
//! - 正常系：メッセージの追加とブロードキャスト
//! - 異常系：空メッセージ

use std::sync::Arc;

use crate::domain::{BroadcastReport, ConnectionId, HistoryRepository, MessagePusher};

use super::error::SendMessageError;

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    /// メッセージ履歴
    history: Arc<dyn HistoryRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl SendMessageUseCase {
    /// 新しい SendMessageUseCase を作成
    pub fn new(history: Arc<dyn HistoryRepository>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            history,
            message_pusher,
        }
    }

    /// メッセージ送信を実行
    ///
    /// # Arguments
    ///
    /// * `origin` - 送信元のコネクション ID（ブロードキャスト対象から除外）
    /// * `message` - 受信したテキストメッセージ
    ///
    /// # Returns
    ///
    /// * `Ok(BroadcastReport)` - 配信結果
    /// * `Err(SendMessageError)` - 空メッセージ
    pub async fn execute(
        &self,
        origin: ConnectionId,
        message: String,
    ) -> Result<BroadcastReport, SendMessageError> {
        if message.is_empty() {
            return Err(SendMessageError::EmptyMessage);
        }

        // 1. 履歴に追加（履歴のロックはここで解放される）
        self.history.append(message.clone()).await;

        // 2. 送信元以外にブロードキャスト
        Ok(self.message_pusher.broadcast(&message, origin).await)
    }
}
