//! InMemory Repository 実装
//!
//! プロセス内の共有状態をそれぞれ独立した Mutex で保護します。
//! 2 つのリポジトリを同時にロックする操作は存在しません。

mod connection;
mod history;

pub use connection::InMemoryConnectionRegistry;
pub use history::InMemoryHistoryRepository;
