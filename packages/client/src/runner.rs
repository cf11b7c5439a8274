//! Client execution logic with reconnection support.

use std::time::Duration;

use super::{error::ClientError, session::run_client_session, ui::spawn_line_reader};

pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;
pub const RECONNECT_INTERVAL: Duration = Duration::from_secs(3);

/// Run the chat client with reconnection logic
///
/// Returns once the user closes the input, or with
/// [`ClientError::ReconnectExhausted`] when the relay stays unreachable.
pub async fn run_client(url: String, user: String) -> Result<(), ClientError> {
    let mut input_rx = spawn_line_reader(user.clone());
    let mut reconnect_count = 0;

    loop {
        tracing::info!(
            "Attempting to connect to {} as '{}' (attempt {}/{})",
            url,
            user,
            reconnect_count + 1,
            MAX_RECONNECT_ATTEMPTS
        );

        match run_client_session(&url, &user, &mut input_rx).await {
            Ok(()) => {
                tracing::info!("Client session ended normally");
                // If the user closed the input, don't reconnect
                break;
            }
            Err(e) => {
                tracing::warn!("{}", e);
                if matches!(e, ClientError::ConnectionLost) {
                    // The relay was reachable; start counting again
                    reconnect_count = 0;
                }
                reconnect_count += 1;

                if reconnect_count >= MAX_RECONNECT_ATTEMPTS {
                    return Err(ClientError::ReconnectExhausted(MAX_RECONNECT_ATTEMPTS));
                }

                tracing::info!(
                    "Reconnecting in {} seconds... (attempt {}/{})",
                    RECONNECT_INTERVAL.as_secs(),
                    reconnect_count + 1,
                    MAX_RECONNECT_ATTEMPTS
                );

                tokio::time::sleep(RECONNECT_INTERVAL).await;
            }
        }
    }

    Ok(())
}
