//! Shared application state.

use std::sync::Arc;

use crate::{
    domain::{ConnectionIdFactory, ServerConfig},
    infrastructure::{
        message_pusher::WebSocketMessagePusher,
        repository::{InMemoryConnectionRegistry, InMemoryHistoryRepository},
    },
    usecase::{
        ConnectParticipantUseCase, DisconnectParticipantUseCase, GetConnectionsUseCase,
        GetHistoryUseCase, SendMessageUseCase, ShutdownRelayUseCase,
    },
};

/// State shared by the accept loop, every connection worker and the admin API
pub struct AppState {
    /// Runtime settings
    pub config: ServerConfig,
    /// ConnectionIdFactory（コネクション ID の採番）
    pub id_factory: ConnectionIdFactory,
    /// ConnectParticipantUseCase（参加者接続のユースケース）
    pub connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    /// DisconnectParticipantUseCase（参加者切断のユースケース）
    pub disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    /// SendMessageUseCase（メッセージ送信のユースケース）
    pub send_message_usecase: Arc<SendMessageUseCase>,
    /// GetConnectionsUseCase（接続一覧取得のユースケース）
    pub get_connections_usecase: Arc<GetConnectionsUseCase>,
    /// GetHistoryUseCase（履歴取得のユースケース）
    pub get_history_usecase: Arc<GetHistoryUseCase>,
    /// ShutdownRelayUseCase（リレー停止のユースケース）
    pub shutdown_relay_usecase: Arc<ShutdownRelayUseCase>,
}

impl AppState {
    /// Wire the relay on top of the in-memory registry and history.
    pub fn in_memory(config: ServerConfig) -> Self {
        // Initialize dependencies in order:
        // 1. Repository
        // 2. MessagePusher
        // 3. UseCases

        // 1. Create Repository (in-memory)
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let history = Arc::new(InMemoryHistoryRepository::new(config.history_capacity));

        // 2. Create MessagePusher (WebSocket frame implementation)
        let message_pusher = Arc::new(WebSocketMessagePusher::new(registry.clone()));

        // 3. Create UseCases
        let connect_participant_usecase = Arc::new(ConnectParticipantUseCase::new(
            registry.clone(),
            history.clone(),
            message_pusher.clone(),
        ));
        let disconnect_participant_usecase =
            Arc::new(DisconnectParticipantUseCase::new(registry.clone()));
        let send_message_usecase = Arc::new(SendMessageUseCase::new(
            history.clone(),
            message_pusher.clone(),
        ));
        let get_connections_usecase = Arc::new(GetConnectionsUseCase::new(registry.clone()));
        let get_history_usecase = Arc::new(GetHistoryUseCase::new(history.clone()));
        let shutdown_relay_usecase = Arc::new(ShutdownRelayUseCase::new(registry, history));

        Self {
            config,
            id_factory: ConnectionIdFactory::new(),
            connect_participant_usecase,
            disconnect_participant_usecase,
            send_message_usecase,
            get_connections_usecase,
            get_history_usecase,
            shutdown_relay_usecase,
        }
    }
}
