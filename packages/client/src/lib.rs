//! Terminal chat client for the Hiroba relay.

pub mod dto;
pub mod error;
mod formatter;
mod runner;
mod session;
mod ui;

pub use runner::{MAX_RECONNECT_ATTEMPTS, RECONNECT_INTERVAL, run_client};
pub use session::run_client_session;
