//! Tool declarations advertised to the model

use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Declaration of a tool available to the model
///
/// Serializes to the `{name, description, parameters}` function schema
/// providers expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDeclaration {
    /// Function name
    pub name: String,
    /// What the tool does
    pub description: String,
    /// JSON Schema for parameters
    pub parameters: Value,
}

impl ToolDeclaration {
    /// Declaration with no parameters
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: json!({"type": "object", "properties": {}}),
        }
    }

    /// Append one parameter to the schema
    pub fn with_param(mut self, param: ToolParam) -> Self {
        if !self.parameters.is_object() {
            self.parameters = json!({"type": "object", "properties": {}});
        }

        let mut definition = Map::new();
        definition.insert("type".to_string(), Value::String(param.kind.as_str().to_string()));
        if let Some(description) = param.description {
            definition.insert("description".to_string(), Value::String(description));
        }

        if let Value::Object(schema) = &mut self.parameters {
            let properties = schema
                .entry("properties")
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(properties) = properties {
                properties.insert(param.name.clone(), Value::Object(definition));
            }

            if param.required {
                let required = schema
                    .entry("required")
                    .or_insert_with(|| Value::Array(Vec::new()));
                if let Value::Array(required) = required {
                    required.push(Value::String(param.name));
                }
            }
        }
        self
    }

    /// Names listed as required in the schema
    pub fn required_params(&self) -> Vec<&str> {
        self.parameters
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// JSON schema primitive types supported for tool parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolParamType {
    Integer,
    Number,
    String,
    Boolean,
    Object,
    Array,
}

impl ToolParamType {
    fn as_str(&self) -> &'static str {
        match self {
            ToolParamType::Integer => "integer",
            ToolParamType::Number => "number",
            ToolParamType::String => "string",
            ToolParamType::Boolean => "boolean",
            ToolParamType::Object => "object",
            ToolParamType::Array => "array",
        }
    }
}

/// One parameter of a tool's contract
#[derive(Debug, Clone)]
pub struct ToolParam {
    pub name: String,
    pub kind: ToolParamType,
    pub required: bool,
    pub description: Option<String>,
}

impl ToolParam {
    /// A required parameter
    pub fn required(name: impl Into<String>, kind: ToolParamType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            description: Some(description.into()),
        }
    }

    /// An optional parameter
    pub fn optional(name: impl Into<String>, kind: ToolParamType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            description: Some(description.into()),
        }
    }
}

/// Create a tool declaration from a type that implements JsonSchema
///
/// Doc comments on the argument struct's fields become parameter
/// descriptions.
///
/// # Example
///
/// ```ignore
/// use schemars::JsonSchema;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, JsonSchema)]
/// struct OrderArgs {
///     /// Order ID of the order, e.g. 100433
///     order_id: String,
/// }
///
/// let decl = create_tool_declaration::<OrderArgs>(
///     "get_order_status",
///     "Get status of the order with the given `order_id`"
/// );
/// ```
pub fn create_tool_declaration<T: JsonSchema>(
    name: impl Into<String>,
    description: impl Into<String>,
) -> ToolDeclaration {
    let schema = schema_for!(T);
    let mut parameters = serde_json::to_value(&schema)
        .unwrap_or_else(|_| json!({"type": "object", "properties": {}}));
    if let Value::Object(map) = &mut parameters {
        map.remove("$schema");
        map.remove("title");
    }
    ToolDeclaration {
        name: name.into(),
        description: description.into(),
        parameters,
    }
}
