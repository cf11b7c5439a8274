//! Admin HTTP API endpoint handlers.
//!
//! Read-only views over the registry and the history.

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use tower_http::trace::TraceLayer;

use crate::{
    infrastructure::dto::http::{ConnectionDto, HealthDto, HistoryDto},
    ui::state::AppState,
};

/// Build the admin router
pub fn admin_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/connections", get(get_connections))
        .route("/api/history", get(get_history))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthDto> {
    Json(HealthDto {
        status: "ok".to_string(),
        connections: state.get_connections_usecase.count().await,
    })
}

/// Get list of live connections
pub async fn get_connections(State(state): State<Arc<AppState>>) -> Json<Vec<ConnectionDto>> {
    let connections = state.get_connections_usecase.execute().await;

    // Domain Model から DTO への変換
    Json(connections.iter().map(ConnectionDto::from).collect())
}

/// Get the backlog replayed to newcomers
pub async fn get_history(State(state): State<Arc<AppState>>) -> Json<HistoryDto> {
    let snapshot = state.get_history_usecase.execute().await;

    Json(HistoryDto {
        capacity: snapshot.capacity,
        messages: snapshot.messages,
    })
}
