// ABOUTME: Typed argument schemas for coach tools, rendered to JSON Schema for the model
// ABOUTME: Validates model-produced arguments before any tool executes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Tool Argument Schemas
//!
//! A deliberately small subset of JSON Schema: an object with typed top-level
//! properties, a required list, and optional array item types. That is all the
//! built-in tools declare, and it keeps validation exact.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::ToolError;

/// JSON type of a declared property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    /// JSON string
    String,
    /// Whole number
    Integer,
    /// Any JSON number
    Number,
    /// `true` or `false`
    Boolean,
    /// JSON array
    Array,
    /// JSON object
    Object,
}

impl PropertyType {
    /// Schema name of the type
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    /// Whether `value` has this JSON type
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }
}

/// Schema of a single property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySchema {
    /// Property type
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    /// Human-readable description for the model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Element schema for arrays
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<PropertySchema>>,
}

impl PropertySchema {
    /// Property of the given type
    #[must_use]
    pub fn new(property_type: PropertyType, description: impl Into<String>) -> Self {
        Self {
            property_type,
            description: Some(description.into()),
            items: None,
        }
    }

    /// String property
    #[must_use]
    pub fn string(description: impl Into<String>) -> Self {
        Self::new(PropertyType::String, description)
    }

    /// Integer property
    #[must_use]
    pub fn integer(description: impl Into<String>) -> Self {
        Self::new(PropertyType::Integer, description)
    }

    /// Array property whose elements have `item_type`
    #[must_use]
    pub fn array_of(item_type: PropertyType, description: impl Into<String>) -> Self {
        Self {
            property_type: PropertyType::Array,
            description: Some(description.into()),
            items: Some(Box::new(Self {
                property_type: item_type,
                description: None,
                items: None,
            })),
        }
    }
}

/// Argument schema of a tool: always a JSON object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentSchema {
    /// Always `"object"`
    #[serde(rename = "type")]
    pub schema_type: String,
    /// Declared properties
    pub properties: BTreeMap<String, PropertySchema>,
    /// Names of required properties
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    /// Whether undeclared properties are accepted
    #[serde(rename = "additionalProperties")]
    pub additional_properties: bool,
}

impl Default for ArgumentSchema {
    fn default() -> Self {
        Self::object()
    }
}

impl ArgumentSchema {
    /// Empty object schema that rejects undeclared properties
    #[must_use]
    pub fn object() -> Self {
        Self {
            schema_type: "object".to_owned(),
            properties: BTreeMap::new(),
            required: Vec::new(),
            additional_properties: false,
        }
    }

    /// Add an optional property
    #[must_use]
    pub fn optional(mut self, name: &str, schema: PropertySchema) -> Self {
        self.properties.insert(name.to_owned(), schema);
        self
    }

    /// Add a required property
    #[must_use]
    pub fn required(mut self, name: &str, schema: PropertySchema) -> Self {
        self.properties.insert(name.to_owned(), schema);
        self.required.push(name.to_owned());
        self
    }

    /// Render as a JSON Schema document
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }

    /// Check `args` against the schema.
    ///
    /// `null` arguments count as an empty object; `null` property values count
    /// as absent.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint as a `ToolError`.
    pub fn validate(&self, tool_name: &str, args: &Value) -> Result<(), ToolError> {
        let empty = Map::new();
        let object = match args {
            Value::Null => &empty,
            Value::Object(map) => map,
            other => {
                return Err(ToolError::invalid_parameter(
                    tool_name,
                    "$",
                    format!("arguments must be a JSON object, got {}", json_type(other)),
                ))
            }
        };

        for name in &self.required {
            if object.get(name).is_none_or(Value::is_null) {
                return Err(ToolError::missing_parameter(tool_name, name));
            }
        }

        for (name, value) in object {
            if value.is_null() {
                continue;
            }
            let Some(schema) = self.properties.get(name) else {
                if self.additional_properties {
                    continue;
                }
                return Err(ToolError::invalid_parameter(
                    tool_name,
                    name,
                    "unknown parameter",
                ));
            };
            check_type(tool_name, name, schema, value)?;
        }
        Ok(())
    }
}

fn check_type(
    tool_name: &str,
    name: &str,
    schema: &PropertySchema,
    value: &Value,
) -> Result<(), ToolError> {
    if !schema.property_type.matches(value) {
        return Err(ToolError::invalid_parameter(
            tool_name,
            name,
            format!(
                "expected {}, got {}",
                schema.property_type.as_str(),
                json_type(value)
            ),
        ));
    }
    if let (Some(items), Value::Array(elements)) = (&schema.items, value) {
        if let Some(index) = elements
            .iter()
            .position(|element| !items.property_type.matches(element))
        {
            return Err(ToolError::invalid_parameter(
                tool_name,
                name,
                format!(
                    "element {index} must be {}, got {}",
                    items.property_type.as_str(),
                    json_type(&elements[index])
                ),
            ));
        }
    }
    Ok(())
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A tool as advertised to the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name
    pub name: String,
    /// Tool description
    pub description: String,
    /// Argument schema
    pub parameters: ArgumentSchema,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn schema() -> ArgumentSchema {
        ArgumentSchema::object()
            .required("query", PropertySchema::string("Food to search"))
            .optional("limit", PropertySchema::integer("Max results"))
            .optional(
                "food_items",
                PropertySchema::array_of(PropertyType::String, "Items"),
            )
    }

    #[test]
    fn test_accepts_valid_arguments() {
        let args = json!({"query": "oats", "limit": 3, "food_items": ["a", "b"]});
        assert!(schema().validate("t", &args).is_ok());
    }

    #[test]
    fn test_rejects_wrong_types_and_unknown_properties() {
        let wrong_type = schema().validate("t", &json!({"query": 5})).unwrap_err();
        assert!(matches!(wrong_type, ToolError::InvalidParameter { ref parameter, .. } if parameter == "query"));

        let unknown = schema()
            .validate("t", &json!({"query": "x", "colour": "red"}))
            .unwrap_err();
        assert!(unknown.to_string().contains("unknown parameter"));

        let bad_item = schema()
            .validate("t", &json!({"query": "x", "food_items": ["a", 2]}))
            .unwrap_err();
        assert!(bad_item.to_string().contains("element 1"));
    }

    #[test]
    fn test_null_counts_as_absent() {
        let err = schema().validate("t", &json!({"query": null})).unwrap_err();
        assert!(matches!(err, ToolError::MissingParameter { .. }));
        assert!(schema()
            .validate("t", &json!({"query": "x", "limit": null}))
            .is_ok());
    }
}
