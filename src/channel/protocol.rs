use crate::view::ViewUpdate;
use serde::{Deserialize, Serialize};

/// Client → Server message types
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "subscribe")]
    Subscribe { view_id: String },
    #[serde(rename = "unsubscribe")]
    Unsubscribe { view_id: String },
}

/// Server → Client: pushed view update
#[derive(Debug, Clone, Serialize)]
pub struct ViewUpdateMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    #[serde(flatten)]
    pub update: ViewUpdate,
}

impl From<ViewUpdate> for ViewUpdateMessage {
    fn from(update: ViewUpdate) -> Self {
        Self {
            msg_type: "view_update".to_string(),
            update,
        }
    }
}

/// Server → Client: subscription change acknowledged
#[derive(Debug, Clone, Serialize)]
pub struct AckMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub view_id: String,
}

impl AckMessage {
    pub fn subscribed(view_id: String) -> Self {
        Self {
            msg_type: "subscribed".to_string(),
            view_id,
        }
    }

    pub fn unsubscribed(view_id: String) -> Self {
        Self {
            msg_type: "unsubscribed".to_string(),
            view_id,
        }
    }
}

/// Server → Client: Error message
#[derive(Debug, Clone, Serialize)]
pub struct ErrorMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub error: String,
}

impl ErrorMessage {
    pub fn new(error: String) -> Self {
        Self {
            msg_type: "error".to_string(),
            error,
        }
    }
}
