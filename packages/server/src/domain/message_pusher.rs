//! MessagePusher trait 定義
//!
//! コネクションへのフレーム送信の抽象化。

use async_trait::async_trait;

use super::{ConnectionId, ConnectionWriterGuard, PushError};

/// Outcome of one broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Recipients that received the full frame
    pub delivered: Vec<ConnectionId>,
    /// Recipients whose write failed; they have been closed and unregistered
    pub dropped: Vec<ConnectionId>,
}

/// Message Pusher trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// ロック済みのコネクションに履歴を順番に送信
    async fn push_backlog(
        &self,
        writer: &mut ConnectionWriterGuard,
        messages: Vec<String>,
    ) -> Result<(), PushError>;

    /// 送信元以外の全コネクションにメッセージを送信
    ///
    /// 書き込みに失敗した宛先はそのコネクションだけを閉じて登録から外し、
    /// 残りの宛先への送信は継続する。
    async fn broadcast(&self, message: &str, origin: ConnectionId) -> BroadcastReport;
}
