//! Bounded backlog of recently relayed messages.

use std::collections::VecDeque;

/// Number of messages kept for replay when no capacity is configured.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Ordered FIFO of the last `capacity` non-empty messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHistory {
    messages: VecDeque<String>,
    capacity: usize,
}

impl MessageHistory {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a message, evicting the oldest one when the bound is exceeded.
    ///
    /// Returns `false` (and stores nothing) for empty messages.
    pub fn push(&mut self, message: String) -> bool {
        if message.is_empty() || self.capacity == 0 {
            return false;
        }

        self.messages.push_back(message);
        if self.messages.len() > self.capacity {
            self.messages.pop_front();
        }
        true
    }

    /// Copy of the backlog, oldest first.
    pub fn snapshot(&self) -> Vec<String> {
        self.messages.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

impl Default for MessageHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_keeps_insertion_order() {
        // テスト項目: 追加した順序でスナップショットが返される
        // given (前提条件):
        let mut history = MessageHistory::new();

        // when (操作):
        history.push("m1".to_string());
        history.push("m2".to_string());
        history.push("m3".to_string());

        // then (期待する結果):
        assert_eq!(history.snapshot(), vec!["m1", "m2", "m3"]);
    }

    #[test]
    fn test_push_evicts_oldest_beyond_capacity() {
        // テスト項目: 上限を超えると最も古いメッセージから破棄される
        // given (前提条件):
        let mut history = MessageHistory::new();

        // when (操作): 150 件追加
        for i in 0..150 {
            history.push(format!("message-{}", i));
        }

        // then (期待する結果): 最後の 100 件が古い順に残る
        let snapshot = history.snapshot();
        assert_eq!(snapshot.len(), DEFAULT_HISTORY_CAPACITY);
        assert_eq!(snapshot.first().map(String::as_str), Some("message-50"));
        assert_eq!(snapshot.last().map(String::as_str), Some("message-149"));
        let expected: Vec<String> = (50..150).map(|i| format!("message-{}", i)).collect();
        assert_eq!(snapshot, expected);
    }

    #[test]
    fn test_push_ignores_empty_message() {
        // テスト項目: 空のメッセージは保存されない
        // given (前提条件):
        let mut history = MessageHistory::new();
        history.push("hello".to_string());

        // when (操作):
        let stored = history.push(String::new());

        // then (期待する結果):
        assert!(!stored);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        // テスト項目: スナップショットはその後の追加の影響を受けない
        // given (前提条件):
        let mut history = MessageHistory::with_capacity(2);
        history.push("a".to_string());
        let snapshot = history.snapshot();

        // when (操作):
        history.push("b".to_string());
        history.push("c".to_string());

        // then (期待する結果):
        assert_eq!(snapshot, vec!["a"]);
        assert_eq!(history.snapshot(), vec!["b", "c"]);
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        // テスト項目: 容量 0 の履歴には何も保存されない
        // given (前提条件):
        let mut history = MessageHistory::with_capacity(0);

        // when (操作):
        let stored = history.push("hello".to_string());

        // then (期待する結果):
        assert!(!stored);
        assert!(history.is_empty());
    }
}
