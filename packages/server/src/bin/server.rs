//! WebSocket broadcast relay.
//!
//! Rebroadcasts every text message to all other connected clients and replays
//! the most recent messages to newcomers.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hiroba-server
//! cargo run --bin hiroba-server -- 9000
//! cargo run --bin hiroba-server -- --host 127.0.0.1 --port 9000 --admin-port 9001
//! ```

use std::sync::Arc;

use clap::Parser;
use hiroba_server::{
    domain::{DEFAULT_HISTORY_CAPACITY, DEFAULT_HOST, ServerConfig},
    ui::{Server, signal::shutdown_signal, state::AppState},
};
use hiroba_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "hiroba-server")]
#[command(about = "WebSocket broadcast relay with message backlog", long_about = None)]
struct Args {
    /// Port number to listen on (same as --port)
    #[arg(value_name = "PORT", conflicts_with = "port")]
    listen_port: Option<u16>,

    /// Host address to bind the relay to
    #[arg(short = 'H', long, default_value = DEFAULT_HOST)]
    host: String,

    /// Port number to bind the relay to
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Port of the read-only admin HTTP API (disabled when omitted)
    #[arg(long)]
    admin_port: Option<u16>,

    /// Number of recent messages replayed to newcomers
    #[arg(long, default_value_t = DEFAULT_HISTORY_CAPACITY)]
    history_capacity: usize,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        let defaults = ServerConfig::default();
        Self {
            host: args.host,
            port: args.port.or(args.listen_port).unwrap_or(defaults.port),
            admin_port: args.admin_port,
            history_capacity: args.history_capacity,
            ..defaults
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();
    let config = ServerConfig::from(args);
    tracing::info!(
        "Message history keeps the last {} message(s)",
        config.history_capacity
    );

    let state = Arc::new(AppState::in_memory(config));
    let server = match Server::bind(state).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Server error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run(shutdown_signal()).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
