use super::client::{ClientConnection, Delivery, DeliveryError, UpdateCallback};
use crate::view::ViewUpdate;
use dashmap::DashMap;
use futures::future::join_all;
use futures::FutureExt;
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

/// Default per-client queue bound for queue-mode clients
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Where a pushed update goes for one client
#[derive(Clone)]
enum Sink {
    Callback(Arc<dyn UpdateCallback>),
    Queue(mpsc::Sender<ViewUpdate>),
}

struct ClientSlot {
    /// Connect order, used for stable fan-out order
    seq: u64,
    connection: ClientConnection,
    sink: Sink,
    /// Receiving half for queue-mode clients
    queue: Option<Arc<Mutex<mpsc::Receiver<ViewUpdate>>>>,
}

/// Identifies a registered broadcast callback for later removal
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BroadcastHandle(u64);

/// Serializable export of channel state
#[derive(Debug, Serialize)]
pub struct ChannelSummary {
    pub connected_clients: usize,
    pub clients: Vec<ClientConnection>,
}

/// Fans view updates out to subscribed clients.
///
/// Deliveries within one `push` run concurrently, so a slow callback does not
/// hold up the others. A failing or panicking recipient is logged and skipped;
/// it never aborts the push and is never retried.
///
/// Queue-mode clients get a bounded queue of `queue_capacity` updates. When it
/// is full the new update is dropped for that client and not counted as
/// delivered; the client can detect the gap from `version`.
pub struct PushChannel {
    clients: DashMap<String, ClientSlot>,
    next_seq: AtomicU64,
    pub(super) broadcast_callbacks: RwLock<Vec<(BroadcastHandle, Arc<dyn UpdateCallback>)>>,
    next_broadcast: AtomicU64,
    queue_capacity: usize,
}

impl PushChannel {
    pub fn new() -> Self {
        Self::with_queue_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    pub fn with_queue_capacity(queue_capacity: usize) -> Self {
        Self {
            clients: DashMap::new(),
            next_seq: AtomicU64::new(0),
            broadcast_callbacks: RwLock::new(Vec::new()),
            next_broadcast: AtomicU64::new(0),
            // mpsc::channel rejects a zero bound
            queue_capacity: queue_capacity.max(1),
        }
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    /// Register a client.
    ///
    /// Connecting an existing `client_id` replaces its connection: the old
    /// queue is dropped and subscriptions start empty.
    pub fn connect(&self, client_id: &str, delivery: Delivery) -> ClientConnection {
        let connection = ClientConnection::new(client_id, delivery.mode());

        let (sink, queue) = match delivery {
            Delivery::Callback(callback) => (Sink::Callback(callback), None),
            Delivery::Queue => {
                let (tx, rx) = mpsc::channel(self.queue_capacity);
                (Sink::Queue(tx), Some(Arc::new(Mutex::new(rx))))
            }
        };

        let slot = ClientSlot {
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
            connection: connection.clone(),
            sink,
            queue,
        };

        if self.clients.insert(client_id.to_string(), slot).is_some() {
            info!(client_id = %client_id, "Client reconnected, subscriptions reset");
        } else {
            info!(client_id = %client_id, mode = ?connection.delivery_mode, "Client connected");
        }

        connection
    }

    pub fn disconnect(&self, client_id: &str) -> bool {
        let removed = self.clients.remove(client_id).is_some();
        if removed {
            info!(client_id = %client_id, "Client disconnected");
        }
        removed
    }

    /// Subscribe a client to a view id, or to every view with `"*"`.
    ///
    /// Returns false if the client is unknown.
    pub fn subscribe(&self, client_id: &str, view_id: &str) -> bool {
        match self.clients.get_mut(client_id) {
            Some(mut slot) => {
                slot.connection.subscribed_views.insert(view_id.to_string());
                slot.connection.touch();
                debug!(client_id = %client_id, view_id = %view_id, "Client subscribed");
                true
            }
            None => false,
        }
    }

    pub fn unsubscribe(&self, client_id: &str, view_id: &str) -> bool {
        match self.clients.get_mut(client_id) {
            Some(mut slot) => {
                slot.connection.subscribed_views.remove(view_id);
                slot.connection.touch();
                debug!(client_id = %client_id, view_id = %view_id, "Client unsubscribed");
                true
            }
            None => false,
        }
    }

    /// Deliver an update to every subscribed client and broadcast callback.
    ///
    /// Returns the number of clients that received it. Broadcast callbacks
    /// and failed deliveries are not counted.
    pub async fn push(&self, update: &ViewUpdate) -> usize {
        let recipients = self.recipients(&update.view_id);
        let broadcasts: Vec<Arc<dyn UpdateCallback>> = self
            .broadcast_callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();

        let client_deliveries = recipients.into_iter().map(|(client_id, sink)| async move {
            let result = deliver(sink, update).await;
            (client_id, result)
        });
        let broadcast_deliveries = broadcasts
            .into_iter()
            .map(|cb| deliver(Sink::Callback(cb), update));

        let (client_results, broadcast_results) = futures::join!(
            join_all(client_deliveries),
            join_all(broadcast_deliveries)
        );

        let mut delivered = 0;
        for (client_id, result) in client_results {
            match result {
                Ok(()) => {
                    delivered += 1;
                    if let Some(mut slot) = self.clients.get_mut(&client_id) {
                        slot.connection.touch();
                    }
                }
                Err(DeliveryError::QueueFull) => {
                    warn!(
                        client_id = %client_id,
                        view_id = %update.view_id,
                        version = update.version,
                        "Client queue full, update dropped"
                    );
                }
                Err(e) => {
                    error!(
                        client_id = %client_id,
                        view_id = %update.view_id,
                        error = %e,
                        "Failed to push update to client"
                    );
                }
            }
        }

        for result in broadcast_results {
            if let Err(e) = result {
                error!(view_id = %update.view_id, error = %e, "Broadcast callback failed");
            }
        }

        debug!(
            view_id = %update.view_id,
            action = update.action(),
            version = update.version,
            delivered = delivered,
            "Pushed update"
        );
        delivered
    }

    /// Pull the next queued update for a queue-mode client.
    ///
    /// `None` timeout waits until an update arrives. Returns `None` on
    /// timeout, for unknown or callback-mode clients, and when the client is
    /// replaced or disconnected while waiting.
    pub async fn get_update(
        &self,
        client_id: &str,
        timeout: Option<Duration>,
    ) -> Option<ViewUpdate> {
        let queue = {
            let slot = self.clients.get(client_id)?;
            Arc::clone(slot.queue.as_ref()?)
        };

        let mut rx = queue.lock().await;
        match timeout {
            Some(duration) => tokio::time::timeout(duration, rx.recv()).await.ok().flatten(),
            None => rx.recv().await,
        }
    }

    /// Register a callback that receives every pushed update regardless of
    /// subscriptions
    pub fn add_broadcast_callback<C: UpdateCallback + 'static>(&self, callback: C) -> BroadcastHandle {
        let handle = BroadcastHandle(self.next_broadcast.fetch_add(1, Ordering::Relaxed));
        self.broadcast_callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((handle, Arc::new(callback)));
        handle
    }

    pub fn remove_broadcast_callback(&self, handle: BroadcastHandle) -> bool {
        let mut callbacks = self
            .broadcast_callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = callbacks.len();
        callbacks.retain(|(h, _)| *h != handle);
        callbacks.len() != before
    }

    pub fn get_client(&self, client_id: &str) -> Option<ClientConnection> {
        self.clients.get(client_id).map(|s| s.connection.clone())
    }

    /// All clients in connect order
    pub fn list_clients(&self) -> Vec<ClientConnection> {
        let mut slots: Vec<(u64, ClientConnection)> = self
            .clients
            .iter()
            .map(|s| (s.seq, s.connection.clone()))
            .collect();
        slots.sort_by_key(|(seq, _)| *seq);
        slots.into_iter().map(|(_, c)| c).collect()
    }

    /// Clients subscribed to `view_id` directly or via the wildcard
    pub fn get_subscribers(&self, view_id: &str) -> Vec<ClientConnection> {
        self.list_clients()
            .into_iter()
            .filter(|c| c.is_subscribed(view_id))
            .collect()
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub fn summary(&self) -> ChannelSummary {
        let clients = self.list_clients();
        ChannelSummary {
            connected_clients: clients.len(),
            clients,
        }
    }

    /// Snapshot of subscribed clients in connect order.
    ///
    /// Collected up front so no map guard is held across deliveries.
    fn recipients(&self, view_id: &str) -> Vec<(String, Sink)> {
        let mut matched: Vec<(u64, String, Sink)> = self
            .clients
            .iter()
            .filter(|s| s.connection.is_subscribed(view_id))
            .map(|s| (s.seq, s.key().clone(), s.sink.clone()))
            .collect();
        matched.sort_by_key(|(seq, _, _)| *seq);
        matched
            .into_iter()
            .map(|(_, client_id, sink)| (client_id, sink))
            .collect()
    }
}

impl Default for PushChannel {
    fn default() -> Self {
        Self::new()
    }
}

async fn deliver(sink: Sink, update: &ViewUpdate) -> Result<(), DeliveryError> {
    match sink {
        Sink::Callback(callback) => {
            match AssertUnwindSafe(callback.deliver(update)).catch_unwind().await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(DeliveryError::Callback(format!("{:#}", e))),
                Err(_) => Err(DeliveryError::Panicked),
            }
        }
        Sink::Queue(tx) => tx.try_send(update.clone()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Disconnected,
        }),
    }
}
