// Explicit runtime context: builds the core parts from config


use crate::channel::PushChannel;
use crate::config::ViewSyncConfig;
use crate::manager::{ManagerOptions, ViewManager};
use crate::registry::ComponentRegistry;
use crate::render::{JsonAdapter, RenderAdapter};
use crate::store::{InMemoryViewStore, ViewStore};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Adapters this crate ships, by key
fn builtin_adapter(name: &str) -> Option<Arc<dyn RenderAdapter>> {
    match name {
        "json" => Some(Arc::new(JsonAdapter::new())),
        _ => None,
    }
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub store: StoreHealth,
    pub push_channel: PushHealth,
    pub uptime_seconds: f64,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct StoreHealth {
    pub status: &'static str,
    pub view_count: usize,
    pub history_len: usize,
}

#[derive(Debug, Serialize)]
pub struct PushHealth {
    pub status: &'static str,
    pub enabled: bool,
    pub connected_clients: usize,
}

#[derive(Debug, Serialize)]
pub struct Capabilities {
    pub module: &'static str,
    pub version: &'static str,
    pub adapters: AdapterCapabilities,
    pub push: PushCapabilities,
    pub limits: Limits,
    pub strict_validation: bool,
    pub component_types: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AdapterCapabilities {
    pub available: Vec<String>,
    pub default: String,
}

#[derive(Debug, Serialize)]
pub struct PushCapabilities {
    pub enabled: bool,
    pub queue_capacity: usize,
}

#[derive(Debug, Serialize)]
pub struct Limits {
    pub history_capacity: usize,
    pub max_history_limit: usize,
}

/// Owns one fully wired set of registry, store, channel and manager.
///
/// Entry points receive a `Runtime` (or its manager) explicitly; independent
/// runtimes share nothing, so tests can build as many as they like.
pub struct Runtime {
    config: ViewSyncConfig,
    manager: Arc<ViewManager>,
    started_at: DateTime<Utc>,
}

impl Runtime {
    /// Build all parts from `config` and load the configured views
    pub fn new(config: ViewSyncConfig) -> anyhow::Result<Self> {
        let registry = Arc::new(ComponentRegistry::new());
        let store: Arc<dyn ViewStore> = Arc::new(InMemoryViewStore::with_history_capacity(
            config.store.history_capacity,
        ));
        let channel = Arc::new(PushChannel::with_queue_capacity(config.push.queue_capacity));

        let manager = ViewManager::new(Arc::clone(&store), channel, registry).with_options(
            ManagerOptions {
                push_enabled: config.push.enabled,
                strict_validation: config.registry.strict_validation,
            },
        );

        configure_adapters(&manager, &config);

        for seed in &config.views {
            let view = seed
                .to_view()
                .with_context(|| format!("Invalid view definition '{}'", seed.id))?;
            if store.get(&view.id).is_some() {
                warn!(view_id = %view.id, "Duplicate view definition, later one wins");
            }
            let view = store.save(view);
            info!(
                view_id = %view.id,
                components = view.components.len(),
                "Loaded view from config"
            );
        }

        info!(
            views = store.list_ids().len(),
            adapters = ?manager.list_adapters(),
            push_enabled = config.push.enabled,
            "Runtime initialized"
        );

        Ok(Self {
            config,
            manager: Arc::new(manager),
            started_at: Utc::now(),
        })
    }

    pub fn manager(&self) -> &Arc<ViewManager> {
        &self.manager
    }

    pub fn config(&self) -> &ViewSyncConfig {
        &self.config
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn health(&self) -> HealthReport {
        let store = self.manager.store();
        let channel = self.manager.channel();
        let uptime = Utc::now() - self.started_at;

        HealthReport {
            status: "healthy",
            store: StoreHealth {
                status: "ok",
                view_count: store.list_ids().len(),
                history_len: store.history_len(),
            },
            push_channel: PushHealth {
                status: "ok",
                enabled: self.manager.options().push_enabled,
                connected_clients: channel.client_count(),
            },
            uptime_seconds: uptime.num_milliseconds() as f64 / 1000.0,
            started_at: self.started_at,
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            module: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            adapters: AdapterCapabilities {
                available: self.manager.list_adapters(),
                default: self.config.render.default_adapter.clone(),
            },
            push: PushCapabilities {
                enabled: self.config.push.enabled,
                queue_capacity: self.manager.channel().queue_capacity(),
            },
            limits: Limits {
                history_capacity: self.config.store.history_capacity,
                max_history_limit: self.config.api.max_history_limit,
            },
            strict_validation: self.config.registry.strict_validation,
            component_types: self
                .manager
                .registry()
                .list()
                .iter()
                .map(|d| d.component_type.to_string())
                .collect(),
        }
    }
}

/// Leave exactly the enabled adapters registered
fn configure_adapters(manager: &ViewManager, config: &ViewSyncConfig) {
    let enabled = &config.render.enabled_adapters;

    for name in manager.list_adapters() {
        if !enabled.contains(&name) {
            manager.unregister_adapter(&name);
        }
    }

    for name in enabled {
        if manager.get_adapter(name).is_some() {
            continue;
        }
        match builtin_adapter(name) {
            Some(adapter) => manager.register_adapter(adapter),
            None => warn!(adapter = %name, "Unknown render adapter in config, skipping"),
        }
    }

    if manager.get_adapter(&config.render.default_adapter).is_none() {
        warn!(
            adapter = %config.render.default_adapter,
            "Default render adapter is not enabled"
        );
    }
}
