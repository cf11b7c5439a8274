//! Relay server configuration.

use std::time::Duration;

use super::DEFAULT_HISTORY_CAPACITY;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_HANDSHAKE_BYTES: usize = 16 * 1024;
pub const DEFAULT_MAX_FRAME_BYTES: usize = 1024 * 1024;

/// Runtime settings for the relay and its optional admin API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the relay listener binds to
    pub host: String,
    /// Port of the relay listener (`0` picks an ephemeral port)
    pub port: u16,
    /// Port of the admin HTTP API; disabled when `None`
    pub admin_port: Option<u16>,
    /// Number of messages replayed to newcomers
    pub history_capacity: usize,
    /// Longest wait for the next handshake bytes
    pub handshake_timeout: Duration,
    /// Largest accepted upgrade request
    pub max_handshake_bytes: usize,
    /// Largest buffered partial frame before it is discarded
    pub max_frame_bytes: usize,
}

impl ServerConfig {
    pub fn relay_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn admin_addr(&self) -> Option<String> {
        self.admin_port.map(|port| format!("{}:{}", self.host, port))
    }

    /// Loopback configuration on ephemeral ports, used by tests and examples.
    pub fn local_ephemeral() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            admin_port: Some(0),
            ..Self::default()
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            admin_port: None,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            max_handshake_bytes: DEFAULT_MAX_HANDSHAKE_BYTES,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }
}
