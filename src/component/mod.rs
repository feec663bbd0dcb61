use crate::registry::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;


/// Component property bag (domain-specific, opaque to the engine)
pub type Properties = HashMap<String, Value>;

/// CSS-like style declarations
pub type Styles = HashMap<String, String>;

/// Built-in UI component types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    Text,
    Chart,
    Table,
    Form,
    Button,
    Image,
    Card,
    List,
    Metric,
    Progress,
    Alert,
    Custom,
}

impl ComponentType {
    pub const ALL: [ComponentType; 12] = [
        ComponentType::Text,
        ComponentType::Chart,
        ComponentType::Table,
        ComponentType::Form,
        ComponentType::Button,
        ComponentType::Image,
        ComponentType::Card,
        ComponentType::List,
        ComponentType::Metric,
        ComponentType::Progress,
        ComponentType::Alert,
        ComponentType::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentType::Text => "text",
            ComponentType::Chart => "chart",
            ComponentType::Table => "table",
            ComponentType::Form => "form",
            ComponentType::Button => "button",
            ComponentType::Image => "image",
            ComponentType::Card => "card",
            ComponentType::List => "list",
            ComponentType::Metric => "metric",
            ComponentType::Progress => "progress",
            ComponentType::Alert => "alert",
            ComponentType::Custom => "custom",
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComponentType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownComponentType(s.to_string()))
    }
}

/// Chart subtypes accepted by the `chart` component
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Line,
    Bar,
    Pie,
    Area,
    Scatter,
    Donut,
}

impl ChartType {
    pub const ALL: [ChartType; 6] = [
        ChartType::Line,
        ChartType::Bar,
        ChartType::Pie,
        ChartType::Area,
        ChartType::Scatter,
        ChartType::Donut,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Line => "line",
            ChartType::Bar => "bar",
            ChartType::Pie => "pie",
            ChartType::Area => "area",
            ChartType::Scatter => "scatter",
            ChartType::Donut => "donut",
        }
    }
}

/// A typed node in a view's component tree.
///
/// Components are owned by exactly one view; ids are unique within that view
/// but may repeat across views.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: String,

    #[serde(rename = "type")]
    pub component_type: ComponentType,

    #[serde(default)]
    pub properties: Properties,

    #[serde(default)]
    pub styles: Styles,

    #[serde(default)]
    pub children: Vec<Component>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Component {
    pub fn new(id: impl Into<String>, component_type: ComponentType) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            component_type,
            properties: Properties::new(),
            styles: Styles::new(),
            children: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_styles(mut self, styles: Styles) -> Self {
        self.styles = styles;
        self
    }

    pub fn with_child(mut self, child: Component) -> Self {
        self.children.push(child);
        self
    }

    /// Merge supplied maps into this component, key by key.
    ///
    /// Keys not present in the deltas are left untouched. Bumps `updated_at`
    /// even when both deltas are empty.
    pub fn merge(&mut self, properties: Option<&Properties>, styles: Option<&Styles>) {
        if let Some(props) = properties {
            self.properties
                .extend(props.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        if let Some(styles) = styles {
            self.styles
                .extend(styles.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        self.updated_at = Utc::now();
    }

    /// Ids of this component and all of its descendants, depth first
    pub fn ids(&self) -> Vec<&str> {
        let mut ids = vec![self.id.as_str()];
        for child in &self.children {
            ids.extend(child.ids());
        }
        ids
    }

    /// First id that occurs more than once in this subtree
    pub fn duplicate_id(&self) -> Option<&str> {
        first_duplicate(self.ids())
    }
}

/// First repeated id in `ids`, in iteration order
pub(crate) fn first_duplicate<'a>(ids: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = HashSet::new();
    ids.into_iter().find(|id| !seen.insert(*id))
}
