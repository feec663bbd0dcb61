use super::connection::WsConnection;
use crate::manager::ViewManager;
use axum::{
    extract::{
        ws::{WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Shared application state for WebSocket handler
#[derive(Clone)]
pub struct WsAppState {
    pub manager: Arc<ViewManager>,
}

/// GET /api/ws - WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<WsAppState>>) -> Response {
    info!("WebSocket upgrade request received");
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Create WebSocket router
pub fn create_ws_router(state: Arc<WsAppState>) -> Router {
    Router::new()
        .route("/api/ws", get(ws_handler))
        .with_state(state)
}

/// Each socket becomes its own push channel client
async fn handle_socket(socket: WebSocket, state: Arc<WsAppState>) {
    let client_id = format!("ws-{}", Uuid::new_v4());
    WsConnection::new(client_id, Arc::clone(&state.manager))
        .handle(socket)
        .await;
}
