//! Connection and HTTP handlers.

mod connection;
mod http;

pub use connection::ConnectionWorker;
pub use http::admin_router;
