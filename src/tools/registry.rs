use crate::types::{Message, ToolCall, ToolDefinition};
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// A tool the model can call.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name, description and parameter schema sent to the model.
    fn definition(&self) -> ToolDefinition;

    /// Run the tool with the call's parsed arguments.
    async fn call(&self, args: Value) -> Result<Value>;

    fn name(&self) -> String {
        self.definition().function.name
    }
}

/// Tools by name.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails if a tool with the same name is already registered.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> Result<&mut Self> {
        self.register_arc(Arc::new(tool))
    }

    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) -> Result<&mut Self> {
        let name = tool.name();
        if self.tools.contains_key(&name) {
            return Err(Error::validation_with_context(
                format!("tool '{}' is already registered", name),
                ErrorContext::new()
                    .with_field_path("function.name")
                    .with_source("tool_registry"),
            ));
        }
        self.tools.insert(name, tool);
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Definitions for `ChatRequest::tools`, ordered by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.definition()).collect()
    }

    /// Run `call` and wrap the result in a `tool` message answering it.
    pub async fn dispatch(&self, call: &ToolCall) -> Result<Message> {
        let tool = self.get(&call.name).ok_or_else(|| {
            Error::validation_with_context(
                format!("unknown tool '{}'", call.name),
                ErrorContext::new()
                    .with_field_path("tool_calls.function.name")
                    .with_source("tool_registry"),
            )
        })?;
        if let Value::String(raw) = &call.arguments {
            // Assembler keeps unparseable argument text as a plain string.
            if serde_json::from_str::<Value>(raw).is_err() {
                return Err(Error::validation_with_context(
                    "tool arguments are not valid JSON",
                    ErrorContext::new()
                        .with_field_path("tool_calls.function.arguments")
                        .with_details(raw.clone())
                        .with_source("tool_registry"),
                ));
            }
        }
        debug!(tool = %call.name, id = %call.id, "dispatching tool call");
        let output = tool.call(call.arguments.clone()).await?;
        let content = match output {
            Value::String(s) => s,
            other => other.to_string(),
        };
        Ok(Message::tool(call.id.clone(), content))
    }

    /// Dispatch every call; failures become `{"error": ...}` tool messages so
    /// the conversation can continue.
    pub async fn dispatch_all(&self, calls: &[ToolCall]) -> Vec<Message> {
        let mut out = Vec::with_capacity(calls.len());
        for call in calls {
            match self.dispatch(call).await {
                Ok(msg) => out.push(msg),
                Err(e) => {
                    warn!(tool = %call.name, error = %e, "tool call failed");
                    out.push(Message::tool(
                        call.id.clone(),
                        json!({"error": e.to_string()}).to_string(),
                    ));
                }
            }
        }
        out
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}
