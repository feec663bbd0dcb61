// Render adapter capability: turns views/components into a target format

mod json;

pub use json::JsonAdapter;

use crate::component::Component;
use crate::view::View;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Result of rendering a view or component through an adapter
#[derive(Clone, Debug, Serialize)]
pub struct RenderResult {
    pub adapter_type: String,
    /// Rendered output (shape depends on the adapter)
    pub content: Value,
    /// MIME type or format identifier
    pub content_type: String,
    pub metadata: HashMap<String, Value>,
    pub rendered_at: DateTime<Utc>,
}

impl RenderResult {
    pub fn new(adapter: &dyn RenderAdapter, content: Value) -> Self {
        Self {
            adapter_type: adapter.adapter_type().to_string(),
            content,
            content_type: adapter.content_type().to_string(),
            metadata: HashMap::new(),
            rendered_at: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }
}

/// Adapter interface. Adapters are looked up by `adapter_type`.
pub trait RenderAdapter: Send + Sync {
    /// Unique key, e.g. "json"
    fn adapter_type(&self) -> &str;

    fn content_type(&self) -> &str;

    fn render_view(&self, view: &View) -> RenderResult;

    fn render_component(&self, component: &Component) -> RenderResult;

    fn supports_streaming(&self) -> bool {
        false
    }
}
