//! UseCase: 履歴取得

use std::sync::Arc;

use crate::domain::HistoryRepository;

/// 履歴の読み取り専用ビュー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistorySnapshot {
    pub capacity: usize,
    pub messages: Vec<String>,
}

/// 履歴取得のユースケース
pub struct GetHistoryUseCase {
    history: Arc<dyn HistoryRepository>,
}

impl GetHistoryUseCase {
    pub fn new(history: Arc<dyn HistoryRepository>) -> Self {
        Self { history }
    }

    /// 履歴を古い順に取得
    pub async fn execute(&self) -> HistorySnapshot {
        HistorySnapshot {
            capacity: self.history.capacity().await,
            messages: self.history.snapshot().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repository::InMemoryHistoryRepository;

    #[tokio::test]
    async fn test_get_history_returns_snapshot() {
        // テスト項目: 容量と古い順のメッセージが取得できる
        // given (前提条件):
        let history = Arc::new(InMemoryHistoryRepository::new(2));
        for message in ["m1", "m2", "m3"] {
            history.append(message.to_string()).await;
        }
        let usecase = GetHistoryUseCase::new(history);

        // when (操作):
        let snapshot = usecase.execute().await;

        // then (期待する結果):
        assert_eq!(
            snapshot,
            HistorySnapshot {
                capacity: 2,
                messages: vec!["m2".to_string(), "m3".to_string()],
            }
        );
    }
}
