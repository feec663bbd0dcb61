use crate::component::{Component, Properties, Styles};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[cfg(test)]
mod tests;

/// A named, versioned tree of components representing one UI screen.
///
/// `version` is owned by the view store: a freshly built view carries 0 and
/// every `save` bumps it by exactly one, so a stored view is always >= 1.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub id: String,
    pub name: String,

    #[serde(default)]
    pub components: Vec<Component>,

    #[serde(default)]
    pub layout: HashMap<String, Value>,

    #[serde(default)]
    pub metadata: HashMap<String, Value>,

    #[serde(default)]
    pub version: u64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl View {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            components: Vec::new(),
            layout: HashMap::new(),
            metadata: HashMap::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Insert a top-level component.
    ///
    /// `None` appends; an out-of-range position is clamped to the end.
    /// Returns the index the component landed at.
    pub fn insert_component(&mut self, component: Component, position: Option<usize>) -> usize {
        let index = position
            .map(|p| p.min(self.components.len()))
            .unwrap_or(self.components.len());
        self.components.insert(index, component);
        index
    }

    /// Find a component anywhere in the tree
    pub fn find_component(&self, component_id: &str) -> Option<&Component> {
        find_in(&self.components, component_id)
    }

    pub fn find_component_mut(&mut self, component_id: &str) -> Option<&mut Component> {
        find_in_mut(&mut self.components, component_id)
    }

    /// Detach a component (and its subtree) from anywhere in the tree
    pub fn remove_component(&mut self, component_id: &str) -> Option<Component> {
        remove_from(&mut self.components, component_id)
    }

    pub fn contains_component(&self, component_id: &str) -> bool {
        self.find_component(component_id).is_some()
    }

    /// Total number of components including nested children
    pub fn component_count(&self) -> usize {
        self.components.iter().map(|c| c.ids().len()).sum()
    }
}

fn find_in<'a>(components: &'a [Component], id: &str) -> Option<&'a Component> {
    for c in components {
        if c.id == id {
            return Some(c);
        }
        if let Some(found) = find_in(&c.children, id) {
            return Some(found);
        }
    }
    None
}

fn find_in_mut<'a>(components: &'a mut [Component], id: &str) -> Option<&'a mut Component> {
    for c in components.iter_mut() {
        if c.id == id {
            return Some(c);
        }
        if let Some(found) = find_in_mut(&mut c.children, id) {
            return Some(found);
        }
    }
    None
}

fn remove_from(components: &mut Vec<Component>, id: &str) -> Option<Component> {
    if let Some(pos) = components.iter().position(|c| c.id == id) {
        return Some(components.remove(pos));
    }
    components
        .iter_mut()
        .find_map(|c| remove_from(&mut c.children, id))
}

/// The state transition carried by a [`ViewUpdate`].
///
/// Serialized adjacently tagged so the wire shape is
/// `{"action": "...", "payload": {...}}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload", rename_all = "snake_case")]
pub enum ViewChange {
    /// Entire current view
    Full(Box<View>),
    AddComponent {
        component: Component,
        position: Option<usize>,
    },
    /// Deltas merged into the component, not its resulting state
    UpdateComponent {
        component_id: String,
        properties: Option<Properties>,
        styles: Option<Styles>,
    },
    RemoveComponent {
        component_id: String,
    },
}

impl ViewChange {
    pub fn action(&self) -> &'static str {
        match self {
            ViewChange::Full(_) => "full",
            ViewChange::AddComponent { .. } => "add_component",
            ViewChange::UpdateComponent { .. } => "update_component",
            ViewChange::RemoveComponent { .. } => "remove_component",
        }
    }
}

/// Immutable record of one state transition applied to a view.
///
/// Consumers must order updates for a view by `version`, not by arrival.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewUpdate {
    pub view_id: String,

    #[serde(flatten)]
    pub change: ViewChange,

    pub version: u64,
    pub timestamp: DateTime<Utc>,
}

impl ViewUpdate {
    pub fn new(view_id: impl Into<String>, version: u64, change: ViewChange) -> Self {
        Self {
            view_id: view_id.into(),
            change,
            version,
            timestamp: Utc::now(),
        }
    }

    /// `full` update carrying a copy of the view at its current version
    pub fn full(view: &View) -> Self {
        Self::new(
            view.id.clone(),
            view.version,
            ViewChange::Full(Box::new(view.clone())),
        )
    }

    pub fn action(&self) -> &'static str {
        self.change.action()
    }
}
