//! WebSocket client session management.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use crate::{dto::ChatPayload, error::ClientError};
use hiroba_shared::time::get_jst_timestamp;

use super::{formatter::MessageFormatter, ui::redisplay_prompt};

/// Run one WebSocket session
///
/// Lines received on `input_rx` are sent as chat payloads; everything the
/// relay pushes (backlog first) is printed.
///
/// # Returns
///
/// * `Ok(())` - The user closed the input
/// * `Err(ClientError)` - The relay was unreachable or the session dropped
pub async fn run_client_session(
    url: &str,
    user: &str,
    input_rx: &mut mpsc::UnboundedReceiver<String>,
) -> Result<(), ClientError> {
    let (ws_stream, _response) = connect_async(url)
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

    tracing::info!("Connected to relay!");
    println!(
        "\nYou are '{}'. Type messages and press Enter to send. Press Ctrl+C to exit.\n",
        user
    );

    let (mut write, mut read) = ws_stream.split();

    // Spawn a task to handle incoming messages
    let user_for_read = user.to_string();
    let mut read_task = tokio::spawn(async move {
        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    // Chat payload from another client, otherwise raw text
                    let formatted = match serde_json::from_str::<ChatPayload>(&text) {
                        Ok(payload) => MessageFormatter::format_chat_message(
                            &payload.user,
                            &payload.text,
                            payload.timestamp,
                        ),
                        Err(_) => MessageFormatter::format_raw_message(&text),
                    };
                    print!("{}", formatted);
                    redisplay_prompt(&user_for_read);
                }
                Ok(Message::Binary(data)) => {
                    print!("{}", MessageFormatter::format_binary_message(data.len()));
                    redisplay_prompt(&user_for_read);
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("Relay closed the connection");
                    break;
                }
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    });

    loop {
        tokio::select! {
            _ = &mut read_task => {
                return Err(ClientError::ConnectionLost);
            }
            line = input_rx.recv() => {
                let Some(line) = line else {
                    // Input closed by the user
                    read_task.abort();
                    write.close().await.ok();
                    return Ok(());
                };

                let payload = ChatPayload::message(user, line, get_jst_timestamp() / 1000);
                let json = match serde_json::to_string(&payload) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::error!("Failed to serialize message: {}", e);
                        continue;
                    }
                };

                if let Err(e) = write.send(Message::Text(json.into())).await {
                    tracing::warn!("Failed to send message: {}", e);
                    read_task.abort();
                    return Err(ClientError::ConnectionLost);
                }

                print!("\n{}", MessageFormatter::format_sent_confirmation(payload.timestamp));
                redisplay_prompt(user);
            }
        }
    }
}
