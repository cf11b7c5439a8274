//! Chat payload exchanged between clients through the relay.
//!
//! The relay treats payloads as opaque text; only clients interpret them.

use serde::{Deserialize, Serialize};

/// Payload kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadType {
    Message,
}

/// `{"type":"message","user":...,"text":...,"timestamp":...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatPayload {
    pub r#type: PayloadType,
    pub user: String,
    pub text: String,
    /// Unix timestamp (seconds)
    pub timestamp: i64,
}

impl ChatPayload {
    pub fn message(user: impl Into<String>, text: impl Into<String>, timestamp: i64) -> Self {
        Self {
            r#type: PayloadType::Message,
            user: user.into(),
            text: text.into(),
            timestamp,
        }
    }
}
