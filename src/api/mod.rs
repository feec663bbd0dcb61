// HTTP query and WebSocket push APIs

mod connection;
pub mod query;
pub mod websocket;

pub use connection::WsConnection;
pub use query::{create_query_router, QueryAppState};
pub use websocket::{create_ws_router, ws_handler, WsAppState};

use crate::runtime::Runtime;
use axum::Router;
use std::sync::Arc;

/// Query and WebSocket routers merged over one runtime
pub fn create_router(runtime: Arc<Runtime>) -> Router {
    let ws_state = Arc::new(WsAppState {
        manager: Arc::clone(runtime.manager()),
    });
    let query_state = Arc::new(QueryAppState { runtime });

    Router::new()
        .merge(create_query_router(query_state))
        .merge(create_ws_router(ws_state))
}
