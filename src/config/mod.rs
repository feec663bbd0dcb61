mod env;
pub mod seed;

pub use seed::{ComponentSeed, ViewSeed};

use crate::channel::DEFAULT_QUEUE_CAPACITY;
use crate::store::DEFAULT_HISTORY_CAPACITY;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Complete viewsync configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewSyncConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub push: PushConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub api: ApiConfig,
    /// Views loaded into the store at startup
    #[serde(default)]
    pub views: Vec<ViewSeed>,
}

/// View store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Maximum retained history entries across all views
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
        }
    }
}

/// Push channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    #[serde(default = "default_push_enabled")]
    pub enabled: bool,
    /// Per-client bound for queue-mode clients
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_push_enabled() -> bool {
    true
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            enabled: default_push_enabled(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// Component registry configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Reject components whose properties violate their type's schema
    #[serde(default)]
    pub strict_validation: bool,
}

/// Render adapter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_enabled_adapters")]
    pub enabled_adapters: Vec<String>,
    #[serde(default = "default_adapter")]
    pub default_adapter: String,
}

fn default_enabled_adapters() -> Vec<String> {
    vec![default_adapter()]
}

fn default_adapter() -> String {
    "json".to_string()
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            enabled_adapters: default_enabled_adapters(),
            default_adapter: default_adapter(),
        }
    }
}

/// HTTP API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Upper bound for the `limit` query parameter on history requests
    #[serde(default = "default_max_history_limit")]
    pub max_history_limit: usize,
}

fn default_bind() -> String {
    "0.0.0.0:8090".to_string()
}

fn default_max_history_limit() -> usize {
    500
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_history_limit: default_max_history_limit(),
        }
    }
}

/// Load configuration from a TOML file.
///
/// A missing file is not an error: defaults are returned instead.
pub fn load_config(path: impl AsRef<Path>) -> anyhow::Result<ViewSyncConfig> {
    let path = path.as_ref();
    if !path.exists() {
        info!(path = %path.display(), "No config file found, using defaults");
        return Ok(ViewSyncConfig::default());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: ViewSyncConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;

    info!(path = %path.display(), views = config.views.len(), "Loaded config");
    Ok(config)
}
