//! Repository trait 定義
//!
//! ユースケース層が必要とする共有状態へのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{Connection, ConnectionId};

/// Message History Repository trait
///
/// 全接続で共有される直近メッセージの履歴。追加は直列化され、
/// スナップショットが追加途中の状態を観測することはない。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// メッセージを追加（空メッセージは保存されず `false` を返す）
    async fn append(&self, message: String) -> bool;

    /// 履歴のコピーを古い順に取得
    async fn snapshot(&self) -> Vec<String>;

    /// 保持できる最大件数
    async fn capacity(&self) -> usize;

    /// 履歴を全て破棄
    async fn clear(&self);
}

/// Connection Registry trait
///
/// 接続中のコネクションの集合。列挙は呼び出し時点のスナップショットを返す。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// コネクションを登録
    async fn register(&self, connection: Connection);

    /// コネクションを削除（存在しない場合は何もしない）
    async fn unregister(&self, id: ConnectionId) -> Option<Connection>;

    /// 指定 ID 以外の全コネクションを取得
    async fn targets_except(&self, id: ConnectionId) -> Vec<Connection>;

    /// 全コネクションを ID 順に取得
    async fn connections(&self) -> Vec<Connection>;

    /// 接続中のコネクション数を取得
    async fn count(&self) -> usize;

    /// 全コネクションを取り出して登録を空にする
    async fn drain(&self) -> Vec<Connection>;
}
