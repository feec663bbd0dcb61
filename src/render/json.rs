use super::{RenderAdapter, RenderResult};
use crate::component::Component;
use crate::view::View;
use serde_json::{json, Value};

/// Renders views as plain JSON for any frontend to interpret
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonAdapter;

impl JsonAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl RenderAdapter for JsonAdapter {
    fn adapter_type(&self) -> &str {
        "json"
    }

    fn content_type(&self) -> &str {
        "application/json"
    }

    fn render_view(&self, view: &View) -> RenderResult {
        let content =
            serde_json::to_value(view).unwrap_or(Value::Object(Default::default()));
        RenderResult::new(self, content)
            .with_metadata("component_count", json!(view.components.len()))
    }

    fn render_component(&self, component: &Component) -> RenderResult {
        let content =
            serde_json::to_value(component).unwrap_or(Value::Object(Default::default()));
        RenderResult::new(self, content)
    }

    fn supports_streaming(&self) -> bool {
        true
    }
}
