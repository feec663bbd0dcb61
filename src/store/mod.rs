// View persistence behind a swappable interface

mod memory;
#[cfg(test)]
mod tests;

pub use memory::{InMemoryViewStore, DEFAULT_HISTORY_CAPACITY};

use crate::view::{View, ViewUpdate};

/// Storage for view aggregates and their update history.
///
/// The store is the sole authority on version numbers: `save` bumps the
/// version of the view it is handed, so callers pass views with their
/// pre-save field values and never set `version` themselves.
pub trait ViewStore: Send + Sync {
    /// Get a view by ID. A miss is not an error.
    fn get(&self, view_id: &str) -> Option<View>;

    fn contains(&self, view_id: &str) -> bool {
        self.get(view_id).is_some()
    }

    /// Upsert by id, setting `updated_at = now` and incrementing `version`.
    ///
    /// Returns the view as stored.
    fn save(&self, view: View) -> View;

    /// Returns false if no view had this id
    fn delete(&self, view_id: &str) -> bool;

    fn list_ids(&self) -> Vec<String>;

    fn list_all(&self) -> Vec<View>;

    /// Append to the bounded history, evicting the oldest entries past capacity
    fn record_update(&self, update: ViewUpdate);

    /// The `limit` most recent updates (optionally for one view), oldest first
    fn get_history(&self, view_id: Option<&str>, limit: usize) -> Vec<ViewUpdate>;

    /// Number of updates currently retained
    fn history_len(&self) -> usize;

    /// Wipe views and history (test/reset only)
    fn clear(&self);
}
