use super::*;
use crate::view::{ViewChange, ViewUpdate};
use anyhow::anyhow;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

fn removal(view_id: &str, version: u64) -> ViewUpdate {
    ViewUpdate::new(
        view_id,
        version,
        ViewChange::RemoveComponent {
            component_id: "c1".to_string(),
        },
    )
}

/// Records every update it receives
#[derive(Clone, Default)]
struct Recorder {
    received: Arc<Mutex<Vec<ViewUpdate>>>,
}

impl Recorder {
    fn count(&self) -> usize {
        self.received.lock().unwrap().len()
    }
}

#[async_trait]
impl UpdateCallback for Recorder {
    async fn deliver(&self, update: &ViewUpdate) -> anyhow::Result<()> {
        self.received.lock().unwrap().push(update.clone());
        Ok(())
    }
}

struct Failing;

#[async_trait]
impl UpdateCallback for Failing {
    async fn deliver(&self, _update: &ViewUpdate) -> anyhow::Result<()> {
        Err(anyhow!("subscriber went away"))
    }
}

struct Panicking;

#[async_trait]
impl UpdateCallback for Panicking {
    async fn deliver(&self, _update: &ViewUpdate) -> anyhow::Result<()> {
        panic!("subscriber bug");
    }
}

#[test]
fn test_connect_and_disconnect() {
    let channel = PushChannel::new();

    let conn = channel.connect("c1", Delivery::Queue);
    assert_eq!(conn.client_id, "c1");
    assert_eq!(conn.delivery_mode, DeliveryMode::Queue);
    assert!(conn.subscribed_views.is_empty());
    assert_eq!(channel.client_count(), 1);

    assert!(channel.disconnect("c1"));
    assert!(!channel.disconnect("c1"));
    assert!(channel.get_client("c1").is_none());
}

#[test]
fn test_subscribe_unknown_client() {
    let channel = PushChannel::new();
    assert!(!channel.subscribe("ghost", "v1"));
    assert!(!channel.unsubscribe("ghost", "v1"));
}

#[test]
fn test_reconnect_resets_subscriptions() {
    let channel = PushChannel::new();
    channel.connect("c1", Delivery::Queue);
    channel.subscribe("c1", "v1");
    assert!(channel.get_client("c1").unwrap().is_subscribed("v1"));

    let conn = channel.connect("c1", Delivery::callback(Recorder::default()));
    assert!(conn.subscribed_views.is_empty());
    assert_eq!(conn.delivery_mode, DeliveryMode::Callback);
    assert_eq!(channel.client_count(), 1);
}

#[test]
fn test_get_subscribers_matches_wildcard() {
    let channel = PushChannel::new();
    channel.connect("a", Delivery::Queue);
    channel.connect("b", Delivery::Queue);
    channel.connect("c", Delivery::Queue);
    channel.subscribe("a", "v1");
    channel.subscribe("b", WILDCARD);

    let ids = |v: &str| -> Vec<String> {
        channel
            .get_subscribers(v)
            .into_iter()
            .map(|c| c.client_id)
            .collect()
    };
    assert_eq!(ids("v1"), vec!["a".to_string(), "b".to_string()]);
    assert_eq!(ids("v2"), vec!["b".to_string()]);

    // Connect order is preserved
    let all: Vec<String> = channel.list_clients().into_iter().map(|c| c.client_id).collect();
    assert_eq!(all, vec!["a".to_string(), "b".to_string(), "c".to_string()]);
}

#[tokio::test]
async fn test_push_respects_subscriptions() {
    let channel = PushChannel::new();
    let a = Recorder::default();
    let b = Recorder::default();
    channel.connect("A", Delivery::callback(a.clone()));
    channel.connect("B", Delivery::callback(b.clone()));
    channel.subscribe("A", "v1");
    channel.subscribe("B", "*");

    assert_eq!(channel.push(&removal("v1", 2)).await, 2);
    assert_eq!(a.count(), 1);
    assert_eq!(b.count(), 1);

    assert_eq!(channel.push(&removal("v2", 2)).await, 1);
    assert_eq!(a.count(), 1);
    assert_eq!(b.count(), 2);
}

#[tokio::test]
async fn test_push_with_no_subscribers() {
    let channel = PushChannel::new();
    channel.connect("A", Delivery::Queue);
    assert_eq!(channel.push(&removal("v1", 2)).await, 0);
}

#[tokio::test]
async fn test_failing_callback_is_isolated() {
    let channel = PushChannel::new();
    let b = Recorder::default();
    channel.connect("A", Delivery::callback(Failing));
    channel.connect("B", Delivery::callback(b.clone()));
    channel.subscribe("A", "v1");
    channel.subscribe("B", "v1");

    for version in 2..=4 {
        assert_eq!(channel.push(&removal("v1", version)).await, 1);
    }
    assert_eq!(b.count(), 3);
}

#[tokio::test]
async fn test_panicking_callback_is_isolated() {
    let channel = PushChannel::new();
    let b = Recorder::default();
    channel.connect("A", Delivery::callback(Panicking));
    channel.connect("B", Delivery::callback(b.clone()));
    channel.subscribe("A", "*");
    channel.subscribe("B", "*");

    assert_eq!(channel.push(&removal("v1", 2)).await, 1);
    assert_eq!(b.count(), 1);
    // The panicking client stays connected
    assert!(channel.get_client("A").is_some());
}

#[tokio::test]
async fn test_closure_callback() {
    let channel = PushChannel::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    channel.connect(
        "closure",
        Delivery::callback(move |update: ViewUpdate| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().unwrap().push(update.version);
                Ok::<(), anyhow::Error>(())
            }
        }),
    );
    channel.subscribe("closure", "v1");

    channel.push(&removal("v1", 7)).await;
    assert_eq!(*seen.lock().unwrap(), vec![7]);
}

#[tokio::test]
async fn test_slow_subscribers_are_dispatched_concurrently() {
    let channel = PushChannel::new();
    for id in ["slow-1", "slow-2", "slow-3"] {
        channel.connect(
            id,
            Delivery::callback(|_update: ViewUpdate| async {
                tokio::time::sleep(Duration::from_millis(150)).await;
                Ok::<(), anyhow::Error>(())
            }),
        );
        channel.subscribe(id, "v1");
    }

    let started = Instant::now();
    assert_eq!(channel.push(&removal("v1", 2)).await, 3);
    // Sequential delivery would take at least 450ms
    assert!(started.elapsed() < Duration::from_millis(400));
}

#[tokio::test]
async fn test_queue_mode_get_update() {
    let channel = PushChannel::new();
    channel.connect("q", Delivery::Queue);
    channel.subscribe("q", "v1");

    assert_eq!(channel.push(&removal("v1", 2)).await, 1);
    assert_eq!(channel.push(&removal("v1", 3)).await, 1);

    let first = channel.get_update("q", Some(Duration::from_millis(50))).await.unwrap();
    let second = channel.get_update("q", None).await.unwrap();
    assert_eq!(first.version, 2);
    assert_eq!(second.version, 3);
}

#[tokio::test]
async fn test_get_update_times_out_with_none() {
    let channel = PushChannel::new();
    channel.connect("q", Delivery::Queue);

    let started = Instant::now();
    let update = channel.get_update("q", Some(Duration::from_millis(30))).await;
    assert!(update.is_none());
    assert!(started.elapsed() >= Duration::from_millis(30));

    assert!(channel.get_update("ghost", Some(Duration::from_millis(1))).await.is_none());
}

#[tokio::test]
async fn test_get_update_wakes_when_update_arrives() {
    let channel = Arc::new(PushChannel::new());
    channel.connect("q", Delivery::Queue);
    channel.subscribe("q", "v1");

    let waiter = {
        let channel = Arc::clone(&channel);
        tokio::spawn(async move { channel.get_update("q", None).await })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    channel.push(&removal("v1", 9)).await;

    let update = waiter.await.unwrap().unwrap();
    assert_eq!(update.version, 9);
}

#[tokio::test]
async fn test_full_queue_drops_and_does_not_count() {
    let channel = PushChannel::with_queue_capacity(2);
    channel.connect("q", Delivery::Queue);
    channel.subscribe("q", "v1");

    assert_eq!(channel.push(&removal("v1", 2)).await, 1);
    assert_eq!(channel.push(&removal("v1", 3)).await, 1);
    assert_eq!(channel.push(&removal("v1", 4)).await, 0);

    let zero = Some(Duration::ZERO);
    assert_eq!(channel.get_update("q", zero).await.unwrap().version, 2);
    assert_eq!(channel.get_update("q", zero).await.unwrap().version, 3);
    assert!(channel.get_update("q", zero).await.is_none());
}

#[tokio::test]
async fn test_broadcast_callbacks_receive_everything() {
    let channel = PushChannel::new();
    let all = Recorder::default();
    let handle = channel.add_broadcast_callback(all.clone());
    channel.add_broadcast_callback(Failing);

    // No clients at all: broadcast still fires, nothing counted
    assert_eq!(channel.push(&removal("v1", 2)).await, 0);
    assert_eq!(channel.push(&removal("v2", 2)).await, 0);
    assert_eq!(all.count(), 2);

    assert!(channel.remove_broadcast_callback(handle));
    assert!(!channel.remove_broadcast_callback(handle));
    channel.push(&removal("v1", 3)).await;
    assert_eq!(all.count(), 2);
}

#[tokio::test]
async fn test_delivery_touches_last_activity() {
    let channel = PushChannel::new();
    let conn = channel.connect("q", Delivery::Queue);
    channel.subscribe("q", "v1");

    tokio::time::sleep(Duration::from_millis(5)).await;
    channel.push(&removal("v1", 2)).await;

    let after = channel.get_client("q").unwrap();
    assert!(after.last_activity_at > conn.last_activity_at);
}

#[test]
fn test_client_message_parsing() {
    let msg: ClientMessage =
        serde_json::from_str(r#"{"type":"subscribe","view_id":"v1"}"#).unwrap();
    assert!(matches!(msg, ClientMessage::Subscribe { view_id } if view_id == "v1"));

    let msg: ClientMessage =
        serde_json::from_str(r#"{"type":"unsubscribe","view_id":"*"}"#).unwrap();
    assert!(matches!(msg, ClientMessage::Unsubscribe { view_id } if view_id == "*"));

    assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"shout"}"#).is_err());
}

#[test]
fn test_update_message_shape() {
    let msg = ViewUpdateMessage::from(removal("v1", 5));
    let value = serde_json::to_value(&msg).unwrap();
    assert_eq!(value["type"], "view_update");
    assert_eq!(value["action"], "remove_component");
    assert_eq!(value["version"], 5);
    assert_eq!(value["payload"]["component_id"], "c1");
}

#[tokio::test]
async fn test_poisoned_broadcast_list_still_usable() {
    let channel = Arc::new(PushChannel::new());
    let poisoner = Arc::clone(&channel);
    let _ = std::thread::spawn(move || {
        let _guard = poisoner.broadcast_callbacks.write().unwrap();
        panic!("callback registry poisoned");
    })
    .join();
    assert!(channel.broadcast_callbacks.is_poisoned());

    let all = Recorder::default();
    let handle = channel.add_broadcast_callback(all.clone());
    channel.push(&removal("v1", 2)).await;
    assert_eq!(all.count(), 1);
    assert!(channel.remove_broadcast_callback(handle));
}
