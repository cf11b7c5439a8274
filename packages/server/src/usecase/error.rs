//! UseCase errors.

use thiserror::Error;

use crate::domain::PushError;

/// 参加者接続のエラー
#[derive(Debug, Error)]
pub enum ConnectError {
    /// 履歴のリプレイ中に書き込みが失敗した
    #[error("failed to replay history: {0}")]
    ReplayFailed(#[source] PushError),
}

/// メッセージ送信のエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendMessageError {
    /// 空メッセージは保存もブロードキャストもされない
    #[error("empty messages are not relayed")]
    EmptyMessage,
}
