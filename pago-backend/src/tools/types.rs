use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// JSON Schema property definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub description: String,
    /// Nested object properties (used by send_money's recipient argument)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<HashMap<String, PropertySchema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

impl PropertySchema {
    pub fn string(description: impl Into<String>) -> Self {
        PropertySchema {
            schema_type: "string".to_string(),
            description: description.into(),
            properties: None,
            required: None,
        }
    }

    pub fn number(description: impl Into<String>) -> Self {
        PropertySchema {
            schema_type: "number".to_string(),
            description: description.into(),
            properties: None,
            required: None,
        }
    }

    pub fn object(
        description: impl Into<String>,
        properties: HashMap<String, PropertySchema>,
        required: Vec<String>,
    ) -> Self {
        PropertySchema {
            schema_type: "object".to_string(),
            description: description.into(),
            properties: Some(properties),
            required: Some(required),
        }
    }

    fn to_json(&self) -> Value {
        let mut prop = serde_json::Map::new();
        prop.insert("type".to_string(), Value::String(self.schema_type.clone()));
        prop.insert(
            "description".to_string(),
            Value::String(self.description.clone()),
        );
        if let Some(ref properties) = self.properties {
            prop.insert(
                "properties".to_string(),
                Value::Object(
                    properties
                        .iter()
                        .map(|(k, v)| (k.clone(), v.to_json()))
                        .collect(),
                ),
            );
        }
        if let Some(ref required) = self.required {
            prop.insert(
                "required".to_string(),
                Value::Array(required.iter().map(|r| Value::String(r.clone())).collect()),
            );
        }
        Value::Object(prop)
    }
}

/// Tool input schema using JSON Schema format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInputSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub properties: HashMap<String, PropertySchema>,
    #[serde(default)]
    pub required: Vec<String>,
}

impl Default for ToolInputSchema {
    fn default() -> Self {
        ToolInputSchema {
            schema_type: "object".to_string(),
            properties: HashMap::new(),
            required: vec![],
        }
    }
}

impl ToolInputSchema {
    pub fn new(properties: HashMap<String, PropertySchema>, required: Vec<String>) -> Self {
        ToolInputSchema {
            schema_type: "object".to_string(),
            properties,
            required,
        }
    }

    /// Wire representation for the completion API's `parameters` field.
    pub fn to_json(&self) -> Value {
        let mut schema = serde_json::Map::new();
        schema.insert("type".to_string(), Value::String(self.schema_type.clone()));
        schema.insert(
            "properties".to_string(),
            Value::Object(
                self.properties
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        );
        schema.insert(
            "required".to_string(),
            Value::Array(
                self.required
                    .iter()
                    .map(|r| Value::String(r.clone()))
                    .collect(),
            ),
        );
        Value::Object(schema)
    }
}

/// Tool definition that gets sent to the AI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: ToolInputSchema,
}

/// Context provided to tools during execution.
///
/// The actor handle is the authenticated transport identity of the sender,
/// injected by the dispatcher. Tools never trust an actor supplied in the
/// model's arguments.
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub actor_handle: String,
}

impl ToolContext {
    pub fn new(actor_handle: impl Into<String>) -> Self {
        ToolContext {
            actor_handle: actor_handle.into(),
        }
    }
}

/// What a handler hands back: the confirmation template it was given plus
/// the values to splice into it.
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    pub template: String,
    pub values: HashMap<String, String>,
}

impl ToolOutcome {
    pub fn text(template: impl Into<String>) -> Self {
        ToolOutcome {
            template: template.into(),
            values: HashMap::new(),
        }
    }

    pub fn with_value(mut self, key: &str, value: impl Into<String>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    /// The user-facing reply, placeholders substituted.
    pub fn render(&self) -> String {
        crate::formatter::format(&self.template, &self.values)
    }
}
