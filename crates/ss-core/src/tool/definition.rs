//! Tool definition helpers

use serde_json::{json, Map, Value as JsonValue};

pub use crate::llm::ToolDefinition;

/// One property of an object schema
pub struct SchemaProperty<'a> {
    pub name: &'a str,
    pub type_str: &'a str,
    pub description: &'a str,
    pub required: bool,
    pub default: Option<JsonValue>,
}

impl<'a> SchemaProperty<'a> {
    /// A required property
    pub fn required(name: &'a str, type_str: &'a str, description: &'a str) -> Self {
        Self {
            name,
            type_str,
            description,
            required: true,
            default: None,
        }
    }

    /// An optional property with a default value
    pub fn optional(
        name: &'a str,
        type_str: &'a str,
        description: &'a str,
        default: JsonValue,
    ) -> Self {
        Self {
            name,
            type_str,
            description,
            required: false,
            default: Some(default),
        }
    }
}

/// Helper functions for creating tool schemas
pub struct SchemaBuilder;

impl SchemaBuilder {
    /// Create an object schema from property descriptions
    pub fn object_schema(properties: Vec<SchemaProperty<'_>>) -> JsonValue {
        let props: Map<String, JsonValue> = properties
            .iter()
            .map(|p| {
                let mut prop = json!({"type": p.type_str, "description": p.description});
                if let Some(default) = &p.default {
                    prop["default"] = default.clone();
                }
                (p.name.to_string(), prop)
            })
            .collect();

        let required: Vec<&str> = properties
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();

        json!({
            "type": "object",
            "properties": props,
            "required": required
        })
    }

    /// Create a string enum schema
    pub fn string_enum(enum_values: &[&str], description: &str) -> JsonValue {
        json!({
            "type": "string",
            "description": description,
            "enum": enum_values
        })
    }
}
