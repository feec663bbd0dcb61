use crate::component::{ComponentType, Properties};
use serde_json::Value;
use thiserror::Error;

/// Validation errors raised while building or checking components
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("unknown component type '{0}'")]
    UnknownComponentType(String),

    #[error("properties must be a JSON object")]
    PropertiesNotObject,

    #[error("component id '{0}' already exists in view")]
    DuplicateComponentId(String),

    #[error("{component_type} component is missing required property '{property}'")]
    MissingProperty {
        component_type: ComponentType,
        property: String,
    },

    #[error("property '{property}' must be of type {expected}")]
    InvalidPropertyType { property: String, expected: String },

    #[error("property '{property}' must be one of {allowed}")]
    NotInEnum { property: String, allowed: String },

    #[error("property '{property}' is out of range: {reason}")]
    OutOfRange { property: String, reason: String },
}

/// Checks `properties` against a component schema.
///
/// Supported schema keywords (a deliberately small JSON-Schema subset):
/// - `required`: list of property names that must be present
/// - `properties.<name>.type`: a type name or list of type names
///   (`string`, `number`, `integer`, `boolean`, `array`, `object`, `null`)
/// - `properties.<name>.enum`: list of allowed values
/// - `properties.<name>.minimum` / `maximum`: numeric bounds
///
/// Unknown keywords and properties not described by the schema are ignored.
pub fn validate_properties(
    component_type: ComponentType,
    schema: &Value,
    properties: &Properties,
) -> Result<(), ValidationError> {
    if let Some(required) = schema.get("required").and_then(|r| r.as_array()) {
        for name in required.iter().filter_map(|n| n.as_str()) {
            if !properties.contains_key(name) {
                return Err(ValidationError::MissingProperty {
                    component_type,
                    property: name.to_string(),
                });
            }
        }
    }

    let Some(rules) = schema.get("properties").and_then(|p| p.as_object()) else {
        return Ok(());
    };

    for (name, value) in properties {
        let Some(rule) = rules.get(name) else {
            continue;
        };
        check_type(name, rule, value)?;
        check_enum(name, rule, value)?;
        check_range(name, rule, value)?;
    }

    Ok(())
}

fn check_type(name: &str, rule: &Value, value: &Value) -> Result<(), ValidationError> {
    let expected: Vec<&str> = match rule.get("type") {
        Some(Value::String(t)) => vec![t.as_str()],
        Some(Value::Array(ts)) => ts.iter().filter_map(|t| t.as_str()).collect(),
        _ => return Ok(()),
    };

    if expected.iter().any(|t| matches_type(t, value)) {
        Ok(())
    } else {
        Err(ValidationError::InvalidPropertyType {
            property: name.to_string(),
            expected: expected.join(" | "),
        })
    }
}

fn matches_type(type_name: &str, value: &Value) -> bool {
    match type_name {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        // Unknown type names never reject
        _ => true,
    }
}

fn check_enum(name: &str, rule: &Value, value: &Value) -> Result<(), ValidationError> {
    let Some(allowed) = rule.get("enum").and_then(|e| e.as_array()) else {
        return Ok(());
    };
    if allowed.contains(value) {
        return Ok(());
    }
    let allowed = allowed
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    Err(ValidationError::NotInEnum {
        property: name.to_string(),
        allowed: format!("[{}]", allowed),
    })
}

fn check_range(name: &str, rule: &Value, value: &Value) -> Result<(), ValidationError> {
    let Some(n) = value.as_f64() else {
        return Ok(());
    };
    if let Some(min) = rule.get("minimum").and_then(|m| m.as_f64()) {
        if n < min {
            return Err(ValidationError::OutOfRange {
                property: name.to_string(),
                reason: format!("{} < minimum {}", n, min),
            });
        }
    }
    if let Some(max) = rule.get("maximum").and_then(|m| m.as_f64()) {
        if n > max {
            return Err(ValidationError::OutOfRange {
                property: name.to_string(),
                reason: format!("{} > maximum {}", n, max),
            });
        }
    }
    Ok(())
}
