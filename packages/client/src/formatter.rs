//! Message formatting utilities for client display.

use hiroba_shared::time::timestamp_to_jst_rfc3339;

const RULE: &str = "------------------------------------------------------------";

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format a chat message
    ///
    /// # Arguments
    ///
    /// * `user` - Name the sender chose
    /// * `text` - The message text
    /// * `sent_at` - Unix timestamp when the message was sent (seconds)
    pub fn format_chat_message(user: &str, text: &str, sent_at: i64) -> String {
        format!(
            "\n\n{rule}\n@{}: {}\nsent at {}\n{rule}\n",
            user,
            text,
            format_seconds(sent_at),
            rule = RULE
        )
    }

    /// Format a confirmation message after sending
    pub fn format_sent_confirmation(sent_at: i64) -> String {
        format!("sent at {}\n", format_seconds(sent_at))
    }

    /// Format a binary message notification
    pub fn format_binary_message(byte_count: usize) -> String {
        format!("\nReceived binary data: {} bytes\n", byte_count)
    }

    /// Format a raw text message (when it is not a chat payload)
    pub fn format_raw_message(text: &str) -> String {
        format!("\nReceived: {}\n", text)
    }
}

fn format_seconds(seconds: i64) -> String {
    timestamp_to_jst_rfc3339(seconds.saturating_mul(1000))
}
