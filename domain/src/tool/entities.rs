//! Tool domain entities

use serde::{Deserialize, Serialize};

use crate::core::error::DomainError;

/// Schema of a tool exposed to the model.
///
/// `name` is the dispatch key and must be unique within a registry.
/// `input_schema` is a JSON-Schema document passed to every vendor
/// unchanged; it is never `null` and defaults to `{"type": "object"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique name of the tool (e.g., "read_file")
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// JSON Schema describing the tool input
    #[serde(default = "default_input_schema")]
    pub input_schema: serde_json::Value,
}

/// The schema used when a tool declares no parameters.
pub fn default_input_schema() -> serde_json::Value {
    serde_json::json!({ "type": "object" })
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: default_input_schema(),
        }
    }

    /// Replace the input schema. A `null` schema falls back to the default.
    pub fn with_input_schema(mut self, schema: serde_json::Value) -> Self {
        self.input_schema = if schema.is_null() {
            default_input_schema()
        } else {
            schema
        };
        self
    }

    /// Check the definition can be used as a dispatch key.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidToolDefinition(
                "tool name must not be empty".to_string(),
            ));
        }
        if !self.input_schema.is_object() {
            return Err(DomainError::InvalidToolDefinition(format!(
                "input schema of '{}' must be a JSON object",
                self.name
            )));
        }
        Ok(())
    }
}

/// A fully assembled tool invocation emitted by a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Vendor-assigned ID, used to correlate the eventual [`ToolResult`](super::ToolResult)
    pub id: String,
    /// Name of the tool to call
    pub name: String,
    /// Arguments as a JSON object (`{}` when the model streamed none)
    pub input: serde_json::Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, input: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input: if input.is_null() {
                serde_json::json!({})
            } else {
                input
            },
        }
    }

    /// Get a string argument
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.input.get(key).and_then(|v| v.as_str())
    }

    /// Get an optional i64 argument
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.input.get(key).and_then(|v| v.as_i64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_defaults_to_object_schema() {
        let def = ToolDefinition::new("read_file", "Read file contents");
        assert_eq!(def.input_schema, serde_json::json!({"type": "object"}));
        assert!(def.validate().is_ok());
    }

    #[test]
    fn test_null_schema_falls_back_to_default() {
        let def = ToolDefinition::new("noop", "").with_input_schema(serde_json::Value::Null);
        assert_eq!(def.input_schema["type"], "object");
    }

    #[test]
    fn test_deserialize_without_schema() {
        let def: ToolDefinition =
            serde_json::from_str(r#"{"name":"x","description":"y"}"#).unwrap();
        assert_eq!(def.input_schema, default_input_schema());
    }

    #[test]
    fn test_validate_rejects_empty_name() {
        let def = ToolDefinition::new("  ", "blank");
        assert!(matches!(
            def.validate(),
            Err(DomainError::InvalidToolDefinition(_))
        ));
    }

    #[test]
    fn test_tool_call_null_input_becomes_empty_object() {
        let call = ToolCall::new("toolu_1", "shell", serde_json::Value::Null);
        assert_eq!(call.input, serde_json::json!({}));
    }

    #[test]
    fn test_tool_call_accessors() {
        let call = ToolCall::new(
            "call_1",
            "read_file",
            serde_json::json!({"path": "/tmp/a", "limit": 3}),
        );
        assert_eq!(call.get_string("path"), Some("/tmp/a"));
        assert_eq!(call.get_i64("limit"), Some(3));
        assert_eq!(call.get_string("missing"), None);
    }
}
