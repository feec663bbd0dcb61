use crate::channel::protocol::{AckMessage, ClientMessage, ErrorMessage, ViewUpdateMessage};
use crate::channel::{Delivery, WILDCARD};
use crate::manager::ViewManager;
use crate::view::ViewUpdate;
use axum::extract::ws::{Message, WebSocket};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Drives one WebSocket as a queue-mode push channel client
pub struct WsConnection {
    client_id: String,
    manager: Arc<ViewManager>,
}

impl WsConnection {
    pub fn new(client_id: String, manager: Arc<ViewManager>) -> Self {
        Self { client_id, manager }
    }

    /// Handle WebSocket connection lifecycle.
    ///
    /// The client is connected on entry and disconnected on exit, whatever
    /// ends the loop.
    pub async fn handle(self, mut socket: WebSocket) {
        let channel = Arc::clone(self.manager.channel());
        channel.connect(&self.client_id, Delivery::Queue);
        info!(client_id = %self.client_id, "WebSocket connection established");

        loop {
            tokio::select! {
                msg = socket.recv() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            if let Err(e) = self.handle_client_message(&mut socket, &text).await {
                                error!(client_id = %self.client_id, error = %e, "Error handling client message");
                                break;
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            info!(client_id = %self.client_id, "WebSocket client disconnected");
                            break;
                        }
                        Some(Ok(Message::Ping(data))) => {
                            if let Err(e) = socket.send(Message::Pong(data)).await {
                                error!(error = %e, "Failed to send pong");
                                break;
                            }
                        }
                        Some(Ok(_)) => {
                            // Ignore binary, pong messages
                        }
                        Some(Err(e)) => {
                            warn!(client_id = %self.client_id, error = %e, "WebSocket error");
                            break;
                        }
                    }
                }

                update = channel.get_update(&self.client_id, None) => {
                    match update {
                        Some(update) => {
                            if let Err(e) = send_update(&mut socket, update).await {
                                error!(client_id = %self.client_id, error = %e, "Failed to send view update");
                                break;
                            }
                        }
                        None => {
                            // Queue closed: the client id was replaced or removed
                            warn!(client_id = %self.client_id, "Client queue closed");
                            break;
                        }
                    }
                }
            }
        }

        channel.disconnect(&self.client_id);
        info!(client_id = %self.client_id, "WebSocket connection closed");
    }

    /// Handle client message (subscribe/unsubscribe).
    ///
    /// Malformed messages get an error reply; only socket failures are errors.
    async fn handle_client_message(&self, socket: &mut WebSocket, text: &str) -> anyhow::Result<()> {
        let msg: ClientMessage = match serde_json::from_str(text) {
            Ok(msg) => msg,
            Err(e) => {
                warn!(client_id = %self.client_id, error = %e, "Invalid client message");
                return send_json(socket, &ErrorMessage::new(format!("invalid message: {e}"))).await;
            }
        };

        let channel = self.manager.channel();
        match msg {
            ClientMessage::Subscribe { view_id } => {
                channel.subscribe(&self.client_id, &view_id);
                info!(client_id = %self.client_id, view_id = %view_id, "Client subscribed to view");

                // Current state first, so the client has a base for later deltas
                let snapshot = if view_id == WILDCARD {
                    None
                } else {
                    self.manager.get_view(&view_id)
                };
                send_json(socket, &AckMessage::subscribed(view_id)).await?;
                if let Some(view) = snapshot {
                    send_update(socket, ViewUpdate::full(&view)).await?;
                }
            }
            ClientMessage::Unsubscribe { view_id } => {
                channel.unsubscribe(&self.client_id, &view_id);
                info!(client_id = %self.client_id, view_id = %view_id, "Client unsubscribed from view");
                send_json(socket, &AckMessage::unsubscribed(view_id)).await?;
            }
        }

        Ok(())
    }
}

async fn send_update(socket: &mut WebSocket, update: ViewUpdate) -> anyhow::Result<()> {
    send_json(socket, &ViewUpdateMessage::from(update)).await
}

async fn send_json<T: Serialize>(socket: &mut WebSocket, msg: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string(msg)?;
    socket.send(Message::Text(json)).await?;
    Ok(())
}
