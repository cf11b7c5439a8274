//! UseCase: 参加者接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectParticipantUseCase::execute() メソッド
//! - 登録と履歴リプレイ
//!
//! ### なぜこのテストが必要か
//! - 新規参加者は直近の履歴を古い順に受け取る必要がある
//! - リプレイが終わるまでライブのブロードキャストが割り込まないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：履歴ありの接続、履歴なしの接続
//! - 異常系：リプレイ中の書き込み失敗

use std::sync::Arc;

use crate::domain::{Connection, ConnectionRegistry, HistoryRepository, MessagePusher};

use super::error::ConnectError;

/// 参加者接続のユースケース
pub struct ConnectParticipantUseCase {
    /// 接続レジストリ
    registry: Arc<dyn ConnectionRegistry>,
    /// メッセージ履歴
    history: Arc<dyn HistoryRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl ConnectParticipantUseCase {
    /// 新しい ConnectParticipantUseCase を作成
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        history: Arc<dyn HistoryRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            registry,
            history,
            message_pusher,
        }
    }

    /// 参加者接続を実行
    ///
    /// 書き込み側をロックしたまま登録と履歴の送信を行うため、
    /// 他の参加者からのブロードキャストは履歴の後に届く。
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - リプレイしたメッセージ数
    /// * `Err(ConnectError)` - リプレイ失敗（登録は残るため呼び出し側で切断する）
    pub async fn execute(&self, connection: Connection) -> Result<usize, ConnectError> {
        // 1. 書き込み側を確保
        let mut writer = connection.lock_writer().await;

        // 2. レジストリに登録
        self.registry.register(connection.clone()).await;

        // 3. 履歴のスナップショットを取得して送信
        let backlog = self.history.snapshot().await;
        let replayed = backlog.len();
        self.message_pusher
            .push_backlog(&mut writer, backlog)
            .await
            .map_err(ConnectError::ReplayFailed)?;

        Ok(replayed)
    }
}
