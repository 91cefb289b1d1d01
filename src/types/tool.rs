//! Tool calling definitions (OpenAI-compatible function calling)

use serde::{Deserialize, Serialize};

/// Tool definition (for function calling)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub tool_type: String, // "function"
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>, // JSON Schema
}

impl ToolDefinition {
    /// Start a function tool definition.
    pub fn function(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: name.into(),
                description: Some(description.into()),
                parameters: None,
            },
        }
    }

    /// Attach a JSON Schema describing the arguments.
    pub fn parameters(mut self, schema: serde_json::Value) -> Self {
        self.function.parameters = Some(schema);
        self
    }

    /// Derive the argument schema from a Rust type.
    pub fn parameters_from<T: schemars::JsonSchema>(self) -> Self {
        let schema = crate::tools::json_schema_from_type::<T>();
        self.parameters(schema)
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }
}

/// Tool call (invocation from model)
///
/// `arguments` holds parsed JSON when the model produced valid JSON and the raw
/// string otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// Request-side encoding of a [`ToolCall`] (`{"id","type","function":{"name","arguments"}}`).
pub(crate) struct WireToolCall<'a>(pub &'a ToolCall);

impl Serialize for WireToolCall<'_> {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let args = match &self.0.arguments {
            serde_json::Value::String(raw) => raw.clone(),
            other => other.to_string(),
        };
        let mut st = s.serialize_struct("ToolCall", 3)?;
        st.serialize_field("id", &self.0.id)?;
        st.serialize_field("type", "function")?;
        st.serialize_field(
            "function",
            &serde_json::json!({"name": self.0.name, "arguments": args}),
        )?;
        st.end()
    }
}

/// Incremental tool call fragment as streamed in `choices[0].delta.tool_calls`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCallDelta {
    pub index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}
