use super::ViewStore;
use crate::view::{View, ViewUpdate};
use chrono::Utc;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

/// Default number of updates retained in history
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// In-memory view store.
///
/// Views live in a concurrent map; history is a strict FIFO bounded by
/// `history_capacity`. Nothing survives a restart.
pub struct InMemoryViewStore {
    /// Lock-free concurrent map for fast reads
    views: Arc<DashMap<String, View>>,

    /// Globally ordered update log, oldest at the front
    pub(super) history: Mutex<VecDeque<ViewUpdate>>,

    history_capacity: usize,
}

impl InMemoryViewStore {
    pub fn new() -> Self {
        Self::with_history_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_history_capacity(history_capacity: usize) -> Self {
        Self {
            views: Arc::new(DashMap::new()),
            history: Mutex::new(VecDeque::new()),
            history_capacity,
        }
    }

    pub fn history_capacity(&self) -> usize {
        self.history_capacity
    }
}

impl Default for InMemoryViewStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewStore for InMemoryViewStore {
    fn get(&self, view_id: &str) -> Option<View> {
        self.views.get(view_id).map(|v| v.clone())
    }

    fn contains(&self, view_id: &str) -> bool {
        self.views.contains_key(view_id)
    }

    fn save(&self, mut view: View) -> View {
        view.updated_at = Utc::now();
        view.version += 1;

        debug!(view_id = %view.id, version = view.version, "Saving view");
        self.views.insert(view.id.clone(), view.clone());
        view
    }

    fn delete(&self, view_id: &str) -> bool {
        let removed = self.views.remove(view_id).is_some();
        if removed {
            info!(view_id = %view_id, "View deleted");
        }
        removed
    }

    fn list_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.views.iter().map(|v| v.key().clone()).collect();
        ids.sort();
        ids
    }

    fn list_all(&self) -> Vec<View> {
        let mut views: Vec<View> = self.views.iter().map(|v| v.value().clone()).collect();
        views.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        views
    }

    fn record_update(&self, update: ViewUpdate) {
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        history.push_back(update);
        while history.len() > self.history_capacity {
            history.pop_front();
        }
    }

    fn get_history(&self, view_id: Option<&str>, limit: usize) -> Vec<ViewUpdate> {
        let history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        let mut recent: Vec<ViewUpdate> = history
            .iter()
            .rev()
            .filter(|u| view_id.map_or(true, |id| u.view_id == id))
            .take(limit)
            .cloned()
            .collect();
        recent.reverse();
        recent
    }

    fn history_len(&self) -> usize {
        self.history.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn clear(&self) {
        self.views.clear();
        self.history.lock().unwrap_or_else(PoisonError::into_inner).clear();
        info!("View store cleared");
    }
}
