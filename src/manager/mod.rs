// View manager: mutation template, fan-out and rendering over the core parts


use crate::channel::{ChannelSummary, PushChannel};
use crate::component::{Component, Properties, Styles};
use crate::envelope::ContextEnvelope;
use crate::registry::{ComponentRegistry, ValidationError};
use crate::render::{JsonAdapter, RenderAdapter, RenderResult};
use crate::store::{InMemoryViewStore, ViewStore};
use crate::view::{View, ViewChange, ViewUpdate};
use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ManagerError {
    #[error("view '{0}' not found")]
    ViewNotFound(String),

    #[error("view '{0}' already exists")]
    ViewExists(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Behaviour switches, normally taken from config
#[derive(Debug, Clone, Copy)]
pub struct ManagerOptions {
    /// When false, updates are still recorded in history but not fanned out
    pub push_enabled: bool,
    /// When true, `add_component` checks the component against registry schemas
    pub strict_validation: bool,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            push_enabled: true,
            strict_validation: false,
        }
    }
}

/// Parameters for `create_view`
#[derive(Debug, Clone, Default)]
pub struct NewView {
    pub id: Option<String>,
    pub name: String,
    pub layout: HashMap<String, Value>,
    pub metadata: HashMap<String, Value>,
}

impl NewView {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_layout(mut self, layout: HashMap<String, Value>) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Outcome of a mutation that was saved and pushed
#[derive(Debug, Clone)]
pub struct Applied<T> {
    pub value: T,
    /// View version after the save
    pub version: u64,
    /// Number of clients that accepted the update
    pub delivered: usize,
}

/// Serializable export of manager state
#[derive(Debug, Serialize)]
pub struct ManagerSummary {
    pub view_count: usize,
    pub view_ids: Vec<String>,
    pub history_len: usize,
    pub component_types: Vec<String>,
    pub adapters: Vec<String>,
    pub push: ChannelSummary,
}

/// A saved and recorded mutation waiting for fan-out
struct Committed<T> {
    value: T,
    view: View,
    update: ViewUpdate,
}

/// Orchestrates registry, store, push channel and render adapters.
///
/// Every mutation runs fetch → mutate → save → record under a per-view lock,
/// so concurrent mutations of one view serialize and none is lost. The lock
/// is released before fan-out; subscribers order updates by `version`.
pub struct ViewManager {
    store: Arc<dyn ViewStore>,
    channel: Arc<PushChannel>,
    registry: Arc<ComponentRegistry>,
    adapters: DashMap<String, Arc<dyn RenderAdapter>>,
    view_locks: DashMap<String, Arc<Mutex<()>>>,
    options: ManagerOptions,
}

impl ViewManager {
    /// Create a manager over the given parts with the JSON adapter registered
    pub fn new(
        store: Arc<dyn ViewStore>,
        channel: Arc<PushChannel>,
        registry: Arc<ComponentRegistry>,
    ) -> Self {
        let manager = Self {
            store,
            channel,
            registry,
            adapters: DashMap::new(),
            view_locks: DashMap::new(),
            options: ManagerOptions::default(),
        };
        manager.register_adapter(Arc::new(JsonAdapter::new()));
        manager
    }

    pub fn with_options(mut self, options: ManagerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> ManagerOptions {
        self.options
    }

    pub fn store(&self) -> &Arc<dyn ViewStore> {
        &self.store
    }

    pub fn channel(&self) -> &Arc<PushChannel> {
        &self.channel
    }

    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    // --- Adapters ---

    /// Register (or replace) an adapter under its `adapter_type`
    pub fn register_adapter(&self, adapter: Arc<dyn RenderAdapter>) {
        let key = adapter.adapter_type().to_string();
        debug!(adapter = %key, "Render adapter registered");
        self.adapters.insert(key, adapter);
    }

    pub fn unregister_adapter(&self, adapter_type: &str) -> bool {
        self.adapters.remove(adapter_type).is_some()
    }

    pub fn get_adapter(&self, adapter_type: &str) -> Option<Arc<dyn RenderAdapter>> {
        self.adapters
            .get(adapter_type)
            .map(|a| Arc::clone(a.value()))
    }

    /// Registered adapter keys, sorted
    pub fn list_adapters(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.adapters.iter().map(|a| a.key().clone()).collect();
        keys.sort();
        keys
    }

    // --- Views ---

    /// Create and persist a new view. Nothing is pushed.
    ///
    /// An id is generated when none is given; an explicit id that is already
    /// taken is rejected rather than overwritten.
    pub fn create_view(&self, ctx: &ContextEnvelope, new: NewView) -> Result<View, ManagerError> {
        let id = new.id.unwrap_or_else(|| Uuid::new_v4().to_string());

        let view = self.with_view_lock(&id, || {
            if self.store.contains(&id) {
                return Err(ManagerError::ViewExists(id.clone()));
            }
            let mut view = View::new(id.clone(), new.name);
            view.layout = new.layout;
            view.metadata = new.metadata;
            Ok(self.store.save(view))
        })?;

        info!(
            view_id = %view.id,
            version = view.version,
            request_id = %ctx.request_id(),
            "View created"
        );
        Ok(view)
    }

    pub fn get_view(&self, view_id: &str) -> Option<View> {
        self.store.get(view_id)
    }

    pub fn list_views(&self) -> Vec<View> {
        self.store.list_all()
    }

    /// Delete a view. No update is emitted; subscribers keep their subscription.
    pub fn delete_view(&self, ctx: &ContextEnvelope, view_id: &str) -> bool {
        let deleted = self.with_view_lock(view_id, || self.store.delete(view_id));

        if deleted {
            info!(view_id = %view_id, request_id = %ctx.request_id(), "View deleted");
        }
        deleted
    }

    // --- Components ---

    /// Build a component from a type name with registry defaults applied.
    ///
    /// `properties` must be a JSON object when given. A UUID id is generated
    /// when `id` is `None`.
    pub fn create_component(
        &self,
        component_type: &str,
        properties: Option<Value>,
        styles: Option<Styles>,
        id: Option<String>,
    ) -> Result<Component, ValidationError> {
        let properties = match properties {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) => Some(map.into_iter().collect::<Properties>()),
            Some(_) => return Err(ValidationError::PropertiesNotObject),
        };
        let id = id.unwrap_or_else(|| Uuid::new_v4().to_string());
        self.registry.create(id, component_type, properties, styles)
    }

    /// Insert a component into a view (append when `position` is `None`)
    pub async fn add_component(
        &self,
        ctx: &ContextEnvelope,
        view_id: &str,
        component: Component,
        position: Option<usize>,
    ) -> Result<Applied<View>, ManagerError> {
        if self.options.strict_validation {
            self.registry.validate(&component)?;
        }

        let committed = self.commit(view_id, |view| {
            let dup = component
                .duplicate_id()
                .or_else(|| component.ids().into_iter().find(|id| view.contains_component(id)));
            if let Some(dup) = dup {
                return Err(ValidationError::DuplicateComponentId(dup.to_string()).into());
            }
            let index = view.insert_component(component.clone(), position);
            let change = ViewChange::AddComponent {
                component,
                position: position.map(|_| index),
            };
            Ok(Some(((), change)))
        })?;

        let Some(committed) = committed else {
            return Err(ManagerError::ViewNotFound(view_id.to_string()));
        };
        let delivered = self.fan_out(ctx, &committed.update).await;
        let version = committed.view.version;
        Ok(Applied {
            value: committed.view,
            version,
            delivered,
        })
    }

    /// Merge property and style deltas into a component.
    ///
    /// Returns `Ok(None)` without saving or pushing when the component is not
    /// in the view. The pushed update carries the deltas as supplied.
    pub async fn update_component(
        &self,
        ctx: &ContextEnvelope,
        view_id: &str,
        component_id: &str,
        properties: Option<Properties>,
        styles: Option<Styles>,
    ) -> Result<Option<Applied<Component>>, ManagerError> {
        let committed = self.commit(view_id, |view| {
            let Some(component) = view.find_component_mut(component_id) else {
                return Ok(None);
            };
            component.merge(properties.as_ref(), styles.as_ref());
            let merged = component.clone();
            let change = ViewChange::UpdateComponent {
                component_id: component_id.to_string(),
                properties,
                styles,
            };
            Ok(Some((merged, change)))
        })?;

        let Some(committed) = committed else {
            return Ok(None);
        };
        let delivered = self.fan_out(ctx, &committed.update).await;
        Ok(Some(Applied {
            value: committed.value,
            version: committed.view.version,
            delivered,
        }))
    }

    /// Remove a component (searching nested children too).
    ///
    /// `Ok(false)` means the view exists but the component does not; the
    /// version is left unchanged and nothing is pushed.
    pub async fn remove_component(
        &self,
        ctx: &ContextEnvelope,
        view_id: &str,
        component_id: &str,
    ) -> Result<bool, ManagerError> {
        let committed = self.commit(view_id, |view| {
            Ok(view.remove_component(component_id).map(|_| {
                let change = ViewChange::RemoveComponent {
                    component_id: component_id.to_string(),
                };
                ((), change)
            }))
        })?;

        match committed {
            Some(committed) => {
                self.fan_out(ctx, &committed.update).await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Push a `full` snapshot of the current view without changing it.
    ///
    /// The snapshot is recorded in history. Returns the recipient count.
    pub async fn push_view(&self, ctx: &ContextEnvelope, view_id: &str) -> Result<usize, ManagerError> {
        let update = self.with_view_lock(view_id, || {
            let view = self
                .store
                .get(view_id)
                .ok_or_else(|| ManagerError::ViewNotFound(view_id.to_string()))?;
            let update = ViewUpdate::full(&view);
            self.store.record_update(update.clone());
            Ok::<_, ManagerError>(update)
        })?;
        Ok(self.fan_out(ctx, &update).await)
    }

    // --- Rendering ---

    /// Render a view. `Ok(None)` when no adapter is registered under `adapter_type`.
    pub fn render(
        &self,
        ctx: &ContextEnvelope,
        view_id: &str,
        adapter_type: &str,
    ) -> Result<Option<RenderResult>, ManagerError> {
        let view = self
            .store
            .get(view_id)
            .ok_or_else(|| ManagerError::ViewNotFound(view_id.to_string()))?;
        let Some(adapter) = self.get_adapter(adapter_type) else {
            debug!(adapter = %adapter_type, request_id = %ctx.request_id(), "Unknown render adapter");
            return Ok(None);
        };
        Ok(Some(adapter.render_view(&view)))
    }

    pub fn render_component(&self, component: &Component, adapter_type: &str) -> Option<RenderResult> {
        self.get_adapter(adapter_type)
            .map(|adapter| adapter.render_component(component))
    }

    // --- Inspection ---

    /// Recent updates, oldest first
    pub fn history(&self, view_id: Option<&str>, limit: usize) -> Vec<ViewUpdate> {
        self.store.get_history(view_id, limit)
    }

    pub fn summary(&self) -> ManagerSummary {
        let view_ids = self.store.list_ids();
        ManagerSummary {
            view_count: view_ids.len(),
            view_ids,
            history_len: self.store.history_len(),
            component_types: self
                .registry
                .list()
                .iter()
                .map(|d| d.component_type.to_string())
                .collect(),
            adapters: self.list_adapters(),
            push: self.channel.summary(),
        }
    }

    // --- Internals ---

    /// Run `f` while holding the lock for `view_id`.
    ///
    /// A lock that was swapped out of the table while we waited on it is
    /// stale, so we retry with the current one. The entry is dropped once the
    /// view no longer exists, which keeps missing ids from piling up.
    fn with_view_lock<R>(&self, view_id: &str, f: impl FnOnce() -> R) -> R {
        loop {
            let lock = Arc::clone(self.view_locks.entry(view_id.to_string()).or_default().value());
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

            let current = self
                .view_locks
                .get(view_id)
                .is_some_and(|entry| Arc::ptr_eq(entry.value(), &lock));
            if !current {
                continue;
            }

            let result = f();
            if !self.store.contains(view_id) {
                self.view_locks.remove_if(view_id, |_, entry| Arc::ptr_eq(entry, &lock));
            }
            return result;
        }
    }

    /// Run one mutation under the view lock: fetch, mutate, save, record.
    ///
    /// `mutate` returns `Ok(None)` to signal "nothing changed", in which case
    /// the view is not saved. A missing view is `ViewNotFound`.
    fn commit<T, F>(&self, view_id: &str, mutate: F) -> Result<Option<Committed<T>>, ManagerError>
    where
        F: FnOnce(&mut View) -> Result<Option<(T, ViewChange)>, ManagerError>,
    {
        self.with_view_lock(view_id, || {
            let mut view = self
                .store
                .get(view_id)
                .ok_or_else(|| ManagerError::ViewNotFound(view_id.to_string()))?;

            let Some((value, change)) = mutate(&mut view)? else {
                return Ok(None);
            };

            let view = self.store.save(view);
            let update = ViewUpdate::new(view_id, view.version, change);
            self.store.record_update(update.clone());

            Ok(Some(Committed {
                value,
                view,
                update,
            }))
        })
    }

    async fn fan_out(&self, ctx: &ContextEnvelope, update: &ViewUpdate) -> usize {
        if !self.options.push_enabled {
            debug!(view_id = %update.view_id, version = update.version, "Push disabled, update recorded only");
            return 0;
        }
        let delivered = self.channel.push(update).await;
        debug!(
            view_id = %update.view_id,
            action = update.action(),
            version = update.version,
            delivered,
            request_id = %ctx.request_id(),
            "Update pushed"
        );
        delivered
    }
}

impl Default for ViewManager {
    fn default() -> Self {
        Self::new(
            Arc::new(InMemoryViewStore::new()),
            Arc::new(PushChannel::new()),
            Arc::new(ComponentRegistry::new()),
        )
    }
}
