//! InMemory History Repository 実装

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{HistoryRepository, MessageHistory};

/// インメモリ履歴リポジトリ
///
/// MessageHistory ドメインモデルを保持し、HistoryRepository trait を実装します。
pub struct InMemoryHistoryRepository {
    history: Mutex<MessageHistory>,
}

impl InMemoryHistoryRepository {
    /// 指定した件数まで保持するリポジトリを作成
    pub fn new(capacity: usize) -> Self {
        Self {
            history: Mutex::new(MessageHistory::with_capacity(capacity)),
        }
    }
}

#[async_trait]
impl HistoryRepository for InMemoryHistoryRepository {
    async fn append(&self, message: String) -> bool {
        let mut history = self.history.lock().await;
        history.push(message)
    }

    async fn snapshot(&self) -> Vec<String> {
        let history = self.history.lock().await;
        history.snapshot()
    }

    async fn capacity(&self) -> usize {
        let history = self.history.lock().await;
        history.capacity()
    }

    async fn clear(&self) {
        let mut history = self.history.lock().await;
        history.clear();
    }
}
