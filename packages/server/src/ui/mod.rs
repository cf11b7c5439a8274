//! Relay server: accept loop, per-connection workers and the admin API.

mod handler;
mod server;
pub mod signal;
pub mod state;

pub use handler::ConnectionWorker;
pub use server::{Server, ServerError};
