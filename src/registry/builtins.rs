use super::ComponentDefinition;
use crate::component::{ChartType, ComponentType, Properties};
use serde_json::{json, Value};

fn props(value: Value) -> Properties {
    match value {
        Value::Object(map) => map.into_iter().collect(),
        _ => Properties::new(),
    }
}

/// Reference definitions registered when a registry is constructed
pub(super) fn builtin_definitions() -> Vec<ComponentDefinition> {
    vec![
        ComponentDefinition::new(
            ComponentType::Text,
            "Text",
            "Display text content with optional formatting",
            json!({
                "type": "object",
                "properties": {
                    "content": {"type": "string"},
                    "variant": {"type": "string", "enum": ["h1", "h2", "h3", "body", "caption"]}
                },
                "required": ["content"]
            }),
        )
        .with_default_properties(props(json!({"variant": "body"}))),
        ComponentDefinition::new(
            ComponentType::Chart,
            "Chart",
            "Display data visualizations (line, bar, pie, etc.)",
            json!({
                "type": "object",
                "properties": {
                    "chart_type": {
                        "type": "string",
                        "enum": ChartType::ALL.iter().map(|c| c.as_str()).collect::<Vec<_>>()
                    },
                    "data": {"type": "array"},
                    "title": {"type": "string"},
                    "x_axis": {"type": "string"},
                    "y_axis": {"type": "string"}
                },
                "required": ["chart_type", "data"]
            }),
        )
        .with_default_properties(props(json!({"chart_type": ChartType::Line.as_str()}))),
        ComponentDefinition::new(
            ComponentType::Table,
            "Table",
            "Display tabular data with optional sorting/filtering",
            json!({
                "type": "object",
                "properties": {
                    "columns": {"type": "array"},
                    "rows": {"type": "array"},
                    "sortable": {"type": "boolean"},
                    "filterable": {"type": "boolean"}
                },
                "required": ["columns", "rows"]
            }),
        )
        .with_default_properties(props(json!({"sortable": true, "filterable": false}))),
        ComponentDefinition::new(
            ComponentType::Form,
            "Form",
            "Interactive form with input fields",
            json!({
                "type": "object",
                "properties": {
                    "fields": {"type": "array"},
                    "submit_label": {"type": "string"},
                    "action": {"type": "string"}
                },
                "required": ["fields"]
            }),
        )
        .with_default_properties(props(json!({"submit_label": "Submit"}))),
        ComponentDefinition::new(
            ComponentType::Metric,
            "Metric",
            "Display a single metric/KPI with optional trend",
            json!({
                "type": "object",
                "properties": {
                    "label": {"type": "string"},
                    "value": {"type": ["string", "number"]},
                    "unit": {"type": "string"},
                    "trend": {"type": "string", "enum": ["up", "down", "flat"]},
                    "trend_value": {"type": "string"}
                },
                "required": ["label", "value"]
            }),
        ),
        ComponentDefinition::new(
            ComponentType::Card,
            "Card",
            "Container card with title and content",
            json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string"},
                    "subtitle": {"type": "string"},
                    "content": {"type": "string"}
                }
            }),
        ),
        ComponentDefinition::new(
            ComponentType::Alert,
            "Alert",
            "Display alert/notification message",
            json!({
                "type": "object",
                "properties": {
                    "message": {"type": "string"},
                    "severity": {"type": "string", "enum": ["info", "success", "warning", "error"]},
                    "dismissible": {"type": "boolean"}
                },
                "required": ["message"]
            }),
        )
        .with_default_properties(props(json!({"severity": "info", "dismissible": true}))),
        ComponentDefinition::new(
            ComponentType::Progress,
            "Progress",
            "Display progress indicator",
            json!({
                "type": "object",
                "properties": {
                    "value": {"type": "number", "minimum": 0, "maximum": 100},
                    "label": {"type": "string"},
                    "variant": {"type": "string", "enum": ["linear", "circular"]}
                },
                "required": ["value"]
            }),
        )
        .with_default_properties(props(json!({"variant": "linear"}))),
    ]
}
