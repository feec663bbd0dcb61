// View definitions declared in config and loaded at startup

use crate::component::{first_duplicate, Component, ComponentType, Properties, Styles};
use crate::registry::ValidationError;
use crate::view::View;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewSeed {
    pub id: String,
    /// Defaults to the id
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub layout: HashMap<String, Value>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    #[serde(default)]
    pub components: Vec<ComponentSeed>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentSeed {
    /// Defaults to `<view_id>-comp-<index>`
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type", default = "default_component_type")]
    pub component_type: String,
    #[serde(default, alias = "props")]
    pub properties: Properties,
    #[serde(default)]
    pub styles: Styles,
}

fn default_component_type() -> String {
    ComponentType::Text.to_string()
}

impl ViewSeed {
    /// Build the view this seed describes.
    ///
    /// Description and tags are folded into metadata. Component ids must be
    /// unique across the view. The view is returned unsaved, at version 0.
    pub fn to_view(&self) -> Result<View, ValidationError> {
        let mut view = View::new(self.id.clone(), self.name.clone().unwrap_or_else(|| self.id.clone()));
        view.layout = self.layout.clone();

        view.metadata = self.metadata.clone();
        view.metadata
            .insert("description".to_string(), Value::String(self.description.clone()));
        view.metadata.insert(
            "tags".to_string(),
            Value::Array(self.tags.iter().cloned().map(Value::String).collect()),
        );

        for (i, seed) in self.components.iter().enumerate() {
            let component_type: ComponentType = seed.component_type.parse()?;
            let id = seed
                .id
                .clone()
                .unwrap_or_else(|| format!("{}-comp-{}", self.id, i));
            let component = Component::new(id, component_type)
                .with_properties(seed.properties.clone())
                .with_styles(seed.styles.clone());
            view.insert_component(component, None);
        }

        if let Some(dup) = first_duplicate(view.components.iter().flat_map(|c| c.ids())) {
            return Err(ValidationError::DuplicateComponentId(dup.to_string()));
        }

        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn seed(toml: &str) -> ViewSeed {
        toml::from_str(toml).unwrap()
    }

    #[test]
    fn test_seed_to_view() {
        let seed = seed(
            r#"
            id = "ops"
            description = "Operations"
            tags = ["ops", "live"]
            layout = { columns = 3 }

            [[components]]
            type = "metric"
            props = { label = "Errors", value = 0 }

            [[components]]
            id = "note"
            properties = { content = "All good" }
            "#,
        );

        let view = seed.to_view().unwrap();
        assert_eq!(view.id, "ops");
        assert_eq!(view.name, "ops");
        assert_eq!(view.version, 0);
        assert_eq!(view.layout["columns"], json!(3));
        assert_eq!(view.metadata["description"], json!("Operations"));
        assert_eq!(view.metadata["tags"], json!(["ops", "live"]));

        assert_eq!(view.components[0].id, "ops-comp-0");
        assert_eq!(view.components[0].component_type, ComponentType::Metric);
        assert_eq!(view.components[0].properties["label"], json!("Errors"));
        assert_eq!(view.components[1].id, "note");
        assert_eq!(view.components[1].component_type, ComponentType::Text);
    }

    #[test]
    fn test_seed_with_unknown_type() {
        let seed = seed(
            r#"
            id = "bad"

            [[components]]
            type = "hologram"
            "#,
        );
        assert_eq!(
            seed.to_view().unwrap_err(),
            ValidationError::UnknownComponentType("hologram".to_string())
        );
    }

    #[test]
    fn test_seed_with_repeated_component_id() {
        let repeated = seed(
            r#"
            id = "ops"

            [[components]]
            id = "dup"
            type = "metric"

            [[components]]
            id = "dup"
            "#,
        );
        assert_eq!(
            repeated.to_view().unwrap_err(),
            ValidationError::DuplicateComponentId("dup".to_string())
        );

        // An explicit id may not take a generated one either
        let clash = seed(
            r#"
            id = "ops"

            [[components]]
            type = "metric"

            [[components]]
            id = "ops-comp-0"
            "#,
        );
        assert_eq!(
            clash.to_view().unwrap_err(),
            ValidationError::DuplicateComponentId("ops-comp-0".to_string())
        );
    }
}
