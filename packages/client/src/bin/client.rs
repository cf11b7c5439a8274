//! Terminal chat client for the Hiroba relay.
//!
//! Sends each entered line as `{"type":"message","user","text","timestamp"}`
//! and prints everything the relay pushes, starting with the backlog.
//! Automatically reconnects on disconnection (max 5 attempts with 3 second interval).
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hiroba-client -- --user Alice
//! cargo run --bin hiroba-client -- -u Bob --url ws://127.0.0.1:9000/
//! ```

use clap::Parser;

use hiroba_client::run_client;
use hiroba_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "hiroba-client")]
#[command(about = "Terminal chat client for the Hiroba WebSocket relay", long_about = None)]
struct Args {
    /// Name shown next to your messages
    #[arg(short = 'u', long)]
    user: String,

    /// WebSocket relay URL
    #[arg(long, default_value = "ws://127.0.0.1:8080/")]
    url: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    // Run the client
    if let Err(e) = run_client(args.url, args.user).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
