// Caller context passed through every manager operation


use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

pub const MAX_ATTRIBUTES: usize = 32;
pub const MAX_ATTRIBUTE_KEY_LENGTH: usize = 64;
pub const MAX_ATTRIBUTE_VALUE_LENGTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnvelopeError {
    #[error("too many attributes: {count} > {max}", max = MAX_ATTRIBUTES)]
    TooManyAttributes { count: usize },

    #[error("attribute key too long: {length} > {max}", max = MAX_ATTRIBUTE_KEY_LENGTH)]
    KeyTooLong { key: String, length: usize },

    #[error("attribute value too long for '{key}': {length} > {max}", max = MAX_ATTRIBUTE_VALUE_LENGTH)]
    ValueTooLong { key: String, length: usize },

    #[error("invalid envelope: {0}")]
    Malformed(String),
}

/// Scalar attribute value. Arrays, objects and null are rejected on decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Float(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

/// Opaque correlation record for multi-tenant and audit plumbing.
///
/// The manager only reads it for logging; it never changes behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextEnvelope {
    pub tenant_id: Option<String>,
    pub principal_id: Option<String>,
    pub session_id: Option<String>,
    pub request_id: Option<String>,
    pub correlation_id: Option<String>,
    pub view_id: Option<String>,
    pub client_id: Option<String>,
    pub agent_id: Option<String>,
    pub tool_name: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub attributes: HashMap<String, AttributeValue>,
}

impl Default for ContextEnvelope {
    fn default() -> Self {
        Self {
            tenant_id: None,
            principal_id: None,
            session_id: None,
            request_id: Some(Uuid::now_v7().to_string()),
            correlation_id: None,
            view_id: None,
            client_id: None,
            agent_id: None,
            tool_name: None,
            timestamp: Utc::now(),
            attributes: HashMap::new(),
        }
    }
}

impl ContextEnvelope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode from an optional JSON object. `None` and `null` give a fresh envelope.
    pub fn from_value(value: Option<Value>) -> Result<Self, EnvelopeError> {
        let envelope = match value {
            None | Some(Value::Null) => Self::default(),
            Some(value) => {
                let mut envelope: ContextEnvelope = serde_json::from_value(value)
                    .map_err(|e| EnvelopeError::Malformed(e.to_string()))?;
                if envelope.request_id.is_none() {
                    envelope.request_id = Some(Uuid::now_v7().to_string());
                }
                envelope
            }
        };
        envelope.validate()?;
        Ok(envelope)
    }

    /// Check attribute limits
    pub fn validate(&self) -> Result<(), EnvelopeError> {
        if self.attributes.len() > MAX_ATTRIBUTES {
            return Err(EnvelopeError::TooManyAttributes {
                count: self.attributes.len(),
            });
        }

        for (key, value) in &self.attributes {
            let key_len = key.chars().count();
            if key_len > MAX_ATTRIBUTE_KEY_LENGTH {
                return Err(EnvelopeError::KeyTooLong {
                    key: key.clone(),
                    length: key_len,
                });
            }
            if let AttributeValue::Text(text) = value {
                let value_len = text.chars().count();
                if value_len > MAX_ATTRIBUTE_VALUE_LENGTH {
                    return Err(EnvelopeError::ValueTooLong {
                        key: key.clone(),
                        length: value_len,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    pub fn with_client(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Copy with `tool_name` set; everything else (including request_id) is kept
    pub fn with_tool(&self, tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: Some(tool_name.into()),
            ..self.clone()
        }
    }

    /// Insert an attribute after checking it fits the limits
    pub fn with_attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Result<Self, EnvelopeError> {
        self.attributes.insert(key.into(), value.into());
        self.validate()?;
        Ok(self)
    }

    /// Request id for log fields; empty when unset
    pub fn request_id(&self) -> &str {
        self.request_id.as_deref().unwrap_or("")
    }
}
