use crate::component::{Component, ComponentType, Properties, Styles};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

mod builtins;
mod validation;

pub use validation::{validate_properties, ValidationError};

/// Definition of a registered component type
#[derive(Clone, Debug, Serialize)]
pub struct ComponentDefinition {
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    pub name: String,
    pub description: String,
    /// JSON-Schema subset used by [`validate_properties`]
    pub schema: Value,
    pub default_properties: Properties,
    pub default_styles: Styles,
    pub registered_at: DateTime<Utc>,
}

impl ComponentDefinition {
    pub fn new(
        component_type: ComponentType,
        name: impl Into<String>,
        description: impl Into<String>,
        schema: Value,
    ) -> Self {
        Self {
            component_type,
            name: name.into(),
            description: description.into(),
            schema,
            default_properties: Properties::new(),
            default_styles: Styles::new(),
            registered_at: Utc::now(),
        }
    }

    pub fn with_default_properties(mut self, properties: Properties) -> Self {
        self.default_properties = properties;
        self
    }

    pub fn with_default_styles(mut self, styles: Styles) -> Self {
        self.default_styles = styles;
        self
    }
}

/// Serializable export of the registry
#[derive(Debug, Serialize)]
pub struct RegistrySummary {
    pub components: Vec<ComponentDefinition>,
}

/// Registry of component definitions.
///
/// Holds at most one definition per type; registering again replaces the
/// previous one (last writer wins). Definitions are immutable once registered.
pub struct ComponentRegistry {
    definitions: Arc<DashMap<ComponentType, Arc<ComponentDefinition>>>,
}

impl ComponentRegistry {
    /// Create a registry pre-loaded with the built-in definitions
    pub fn new() -> Self {
        let registry = Self::empty();
        for definition in builtins::builtin_definitions() {
            registry.register(definition);
        }
        registry
    }

    /// Create a registry with no definitions
    pub fn empty() -> Self {
        Self {
            definitions: Arc::new(DashMap::new()),
        }
    }

    /// Insert or replace the definition for `definition.component_type`.
    ///
    /// The schema itself is not validated.
    pub fn register(&self, definition: ComponentDefinition) {
        debug!(component_type = %definition.component_type, "Registering component definition");
        self.definitions
            .insert(definition.component_type, Arc::new(definition));
    }

    pub fn get(&self, component_type: ComponentType) -> Option<Arc<ComponentDefinition>> {
        self.definitions
            .get(&component_type)
            .map(|d| Arc::clone(d.value()))
    }

    /// All definitions, ordered by component type
    pub fn list(&self) -> Vec<Arc<ComponentDefinition>> {
        let mut definitions: Vec<Arc<ComponentDefinition>> = self
            .definitions
            .iter()
            .map(|d| Arc::clone(d.value()))
            .collect();
        definitions.sort_by_key(|d| d.component_type);
        definitions
    }

    /// Build a component from a type name.
    ///
    /// Fails only when `component_type` is not a known type. A known type
    /// without a registered definition gets empty defaults.
    pub fn create(
        &self,
        id: impl Into<String>,
        component_type: &str,
        properties: Option<Properties>,
        styles: Option<Styles>,
    ) -> Result<Component, ValidationError> {
        let component_type: ComponentType = component_type.parse()?;
        Ok(self.instantiate(id, component_type, properties, styles))
    }

    /// Build a component with definition defaults applied.
    ///
    /// Caller-supplied values win key by key over the defaults.
    pub fn instantiate(
        &self,
        id: impl Into<String>,
        component_type: ComponentType,
        properties: Option<Properties>,
        styles: Option<Styles>,
    ) -> Component {
        let (mut merged_props, mut merged_styles) = match self.get(component_type) {
            Some(def) => (def.default_properties.clone(), def.default_styles.clone()),
            None => (Properties::new(), Styles::new()),
        };

        if let Some(props) = properties {
            merged_props.extend(props);
        }
        if let Some(styles) = styles {
            merged_styles.extend(styles);
        }

        Component::new(id, component_type)
            .with_properties(merged_props)
            .with_styles(merged_styles)
    }

    /// Check a component (and its children) against the registered schemas.
    ///
    /// Types without a definition are accepted as-is.
    pub fn validate(&self, component: &Component) -> Result<(), ValidationError> {
        if let Some(def) = self.get(component.component_type) {
            validate_properties(component.component_type, &def.schema, &component.properties)?;
        }
        for child in &component.children {
            self.validate(child)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn to_summary(&self) -> RegistrySummary {
        RegistrySummary {
            components: self.list().iter().map(|d| (**d).clone()).collect(),
        }
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
