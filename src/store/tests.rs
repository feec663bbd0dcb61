use super::*;
use crate::view::ViewChange;
use std::sync::Arc;
use std::thread;

fn removal(view_id: &str, version: u64, component_id: &str) -> ViewUpdate {
    ViewUpdate::new(
        view_id,
        version,
        ViewChange::RemoveComponent {
            component_id: component_id.to_string(),
        },
    )
}

#[test]
fn test_get_missing_view() {
    let store = InMemoryViewStore::new();
    assert!(store.get("nonexistent").is_none());
}

#[test]
fn test_save_bumps_version_every_time() {
    let store = InMemoryViewStore::new();

    let saved = store.save(View::new("v1", "Dash"));
    assert_eq!(saved.version, 1);

    for k in 2..=5 {
        let current = store.get("v1").unwrap();
        let saved = store.save(current);
        assert_eq!(saved.version, k);
    }
    assert_eq!(store.get("v1").unwrap().version, 5);
}

#[test]
fn test_save_sets_updated_at() {
    let store = InMemoryViewStore::new();
    let view = View::new("v1", "Dash");
    let created = view.created_at;

    let saved = store.save(view);
    assert!(saved.updated_at >= created);
    assert_eq!(saved.created_at, created);
}

#[test]
fn test_delete_and_list() {
    let store = InMemoryViewStore::new();
    store.save(View::new("b", "B"));
    store.save(View::new("a", "A"));

    assert_eq!(store.list_ids(), vec!["a".to_string(), "b".to_string()]);
    assert_eq!(store.list_all().len(), 2);

    assert!(store.delete("a"));
    assert!(!store.delete("a"));
    assert_eq!(store.list_ids(), vec!["b".to_string()]);
}

#[test]
fn test_history_is_bounded_fifo() {
    let store = InMemoryViewStore::with_history_capacity(3);

    for i in 1..=5 {
        store.record_update(removal("v1", i, &format!("c{}", i)));
    }

    assert_eq!(store.history_len(), 3);
    let history = store.get_history(None, 10);
    let versions: Vec<u64> = history.iter().map(|u| u.version).collect();
    assert_eq!(versions, vec![3, 4, 5]);
}

#[test]
fn test_history_filter_and_limit() {
    let store = InMemoryViewStore::new();
    store.record_update(removal("v1", 2, "a"));
    store.record_update(removal("v2", 2, "b"));
    store.record_update(removal("v1", 3, "c"));
    store.record_update(removal("v1", 4, "d"));

    let v1 = store.get_history(Some("v1"), 100);
    assert_eq!(v1.len(), 3);
    assert!(v1.iter().all(|u| u.view_id == "v1"));

    // Limit keeps the most recent, in chronological order
    let last_two = store.get_history(Some("v1"), 2);
    let versions: Vec<u64> = last_two.iter().map(|u| u.version).collect();
    assert_eq!(versions, vec![3, 4]);

    assert!(store.get_history(Some("v3"), 10).is_empty());
    assert!(store.get_history(None, 0).is_empty());
}

#[test]
fn test_clear_wipes_views_and_history() {
    let store = InMemoryViewStore::new();
    store.save(View::new("v1", "Dash"));
    store.record_update(removal("v1", 2, "a"));

    store.clear();

    assert!(store.list_ids().is_empty());
    assert_eq!(store.history_len(), 0);
}

#[test]
fn test_store_behind_trait_object() {
    let store: Arc<dyn ViewStore> = Arc::new(InMemoryViewStore::new());
    let saved = store.save(View::new("v1", "Dash"));
    assert_eq!(saved.version, 1);
    assert_eq!(store.get("v1").unwrap().name, "Dash");
}

#[test]
fn test_concurrent_saves_of_distinct_views() {
    let store = Arc::new(InMemoryViewStore::new());
    let mut handles = vec![];

    for i in 0..10 {
        let store = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            store.save(View::new(format!("view_{}", i), "V"));
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.list_all().len(), 10);
    assert!(store.list_all().iter().all(|v| v.version == 1));
}

#[test]
fn test_poisoned_history_still_usable() {
    let store = Arc::new(InMemoryViewStore::with_history_capacity(2));
    store.record_update(removal("v1", 2, "c1"));

    let poisoner = Arc::clone(&store);
    let _ = thread::spawn(move || {
        let _guard = poisoner.history.lock().unwrap();
        panic!("history poisoned");
    })
    .join();
    assert!(store.history.is_poisoned());

    store.record_update(removal("v1", 3, "c2"));
    store.record_update(removal("v1", 4, "c3"));
    assert_eq!(store.history_len(), 2);
    assert_eq!(store.get_history(Some("v1"), 10)[0].version, 3);
}

#[test]
fn test_contains_tracks_saves_and_deletes() {
    let store = InMemoryViewStore::new();
    assert!(!store.contains("v1"));
    store.save(View::new("v1", "Dash"));
    assert!(store.contains("v1"));
    store.delete("v1");
    assert!(!store.contains("v1"));
}
