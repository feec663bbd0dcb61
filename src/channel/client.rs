use crate::view::ViewUpdate;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// Subscription id matching every view
pub const WILDCARD: &str = "*";

/// Receives pushed updates for a callback-mode client or a broadcast hook.
///
/// Returning an error marks the delivery as failed; it is logged by the
/// channel and never retried.
#[async_trait]
pub trait UpdateCallback: Send + Sync {
    async fn deliver(&self, update: &ViewUpdate) -> anyhow::Result<()>;
}

#[async_trait]
impl<F, Fut> UpdateCallback for F
where
    F: Fn(ViewUpdate) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn deliver(&self, update: &ViewUpdate) -> anyhow::Result<()> {
        (self)(update.clone()).await
    }
}

/// How a client wants updates handed to it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// Invoke a registered callback per update
    Callback,
    /// Buffer updates for retrieval with `get_update`
    Queue,
}

/// Delivery target supplied at connect time
#[derive(Clone)]
pub enum Delivery {
    Callback(Arc<dyn UpdateCallback>),
    Queue,
}

impl Delivery {
    pub fn callback<C: UpdateCallback + 'static>(callback: C) -> Self {
        Delivery::Callback(Arc::new(callback))
    }

    pub fn mode(&self) -> DeliveryMode {
        match self {
            Delivery::Callback(_) => DeliveryMode::Callback,
            Delivery::Queue => DeliveryMode::Queue,
        }
    }
}

/// A connected client and its subscriptions
#[derive(Clone, Debug, Serialize)]
pub struct ClientConnection {
    pub client_id: String,
    pub delivery_mode: DeliveryMode,
    /// View ids, possibly including [`WILDCARD`]
    pub subscribed_views: BTreeSet<String>,
    pub connected_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub metadata: HashMap<String, Value>,
}

impl ClientConnection {
    pub(crate) fn new(client_id: &str, delivery_mode: DeliveryMode) -> Self {
        let now = Utc::now();
        Self {
            client_id: client_id.to_string(),
            delivery_mode,
            subscribed_views: BTreeSet::new(),
            connected_at: now,
            last_activity_at: now,
            metadata: HashMap::new(),
        }
    }

    /// True if subscribed to `view_id` directly or through the wildcard
    pub fn is_subscribed(&self, view_id: &str) -> bool {
        self.subscribed_views.contains(view_id) || self.subscribed_views.contains(WILDCARD)
    }

    pub(crate) fn touch(&mut self) {
        self.last_activity_at = Utc::now();
    }
}

/// Why a single delivery failed. Isolated per recipient.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("callback failed: {0}")]
    Callback(String),

    #[error("callback panicked")]
    Panicked,

    #[error("queue full")]
    QueueFull,

    #[error("client queue closed")]
    Disconnected,
}
