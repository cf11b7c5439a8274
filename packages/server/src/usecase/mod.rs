//! UseCase layer: one type per relay operation.

mod connect_participant;
mod disconnect_participant;
mod error;
mod get_connections;
mod get_history;
mod send_message;
mod shutdown_relay;

pub use connect_participant::ConnectParticipantUseCase;
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use error::{ConnectError, SendMessageError};
pub use get_connections::GetConnectionsUseCase;
pub use get_history::{GetHistoryUseCase, HistorySnapshot};
pub use send_message::SendMessageUseCase;
pub use shutdown_relay::ShutdownRelayUseCase;
