//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

use crate::domain::Connection;
use hiroba_shared::time::timestamp_to_jst_rfc3339;

/// Health check response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthDto {
    pub status: String,
    /// Number of live relay connections
    pub connections: usize,
}

/// One live relay connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDto {
    pub id: u64,
    /// RFC 3339 (JST)
    pub connected_at: String,
}

/// Message backlog replayed to newcomers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryDto {
    pub capacity: usize,
    /// Oldest first
    pub messages: Vec<String>,
}

impl From<&Connection> for ConnectionDto {
    fn from(connection: &Connection) -> Self {
        Self {
            id: connection.id().value(),
            connected_at: timestamp_to_jst_rfc3339(connection.connected_at()),
        }
    }
}
