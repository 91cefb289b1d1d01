//! Chat-completion request and response bodies

use crate::types::message::{Message, MessageRole};
use crate::types::tool::{ToolCall, ToolDefinition, WireToolCall};
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const DEFAULT_MODEL: &str = "deepseek-chat";
pub const REASONER_MODEL: &str = "deepseek-reasoner";

/// Token accounting reported by the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// Chat-completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub stream: bool,
    pub tools: Vec<ToolDefinition>,
    pub tool_choice: Option<Value>,
}

impl ChatRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            messages,
            temperature: None,
            max_tokens: None,
            stream: false,
            tools: Vec::new(),
            tool_choice: None,
        }
    }

    /// Single user prompt.
    pub fn prompt(text: impl Into<String>) -> Self {
        Self::new(vec![Message::user(text)])
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn temperature(mut self, temp: f64) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn tool_choice(mut self, tool_choice: Value) -> Self {
        self.tool_choice = Some(tool_choice);
        self
    }

    /// Reject requests the API would refuse anyway.
    pub fn validate(&self) -> Result<()> {
        if self.messages.is_empty() {
            return Err(Error::validation_with_context(
                "request must contain at least one message",
                ErrorContext::new()
                    .with_field_path("request.messages")
                    .with_source("request_validator"),
            ));
        }
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(Error::validation_with_context(
                    "temperature must be within 0.0..=2.0",
                    ErrorContext::new()
                        .with_field_path("request.temperature")
                        .with_details(t.to_string())
                        .with_source("request_validator"),
                ));
            }
        }
        if self.tool_choice.is_some() && self.tools.is_empty() {
            return Err(Error::validation_with_context(
                "tool_choice requires at least one tool",
                ErrorContext::new()
                    .with_field_path("request.tool_choice")
                    .with_source("request_validator"),
            ));
        }
        Ok(())
    }

    /// Encode as the JSON body expected by `/chat/completions`.
    pub fn to_body(&self) -> Result<Value> {
        let messages = self
            .messages
            .iter()
            .map(message_to_wire)
            .collect::<Result<Vec<_>>>()?;

        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "stream": self.stream,
        });
        if let Some(t) = self.temperature {
            body["temperature"] = json!(t);
        }
        if let Some(m) = self.max_tokens {
            body["max_tokens"] = json!(m);
        }
        if !self.tools.is_empty() {
            body["tools"] = serde_json::to_value(&self.tools)?;
        }
        if let Some(tc) = &self.tool_choice {
            body["tool_choice"] = tc.clone();
        }
        if self.stream {
            body["stream_options"] = json!({"include_usage": true});
        }
        Ok(body)
    }
}

fn message_to_wire(msg: &Message) -> Result<Value> {
    let mut v = json!({
        "role": msg.role.as_str(),
        "content": msg.content,
    });
    if msg.role == MessageRole::Assistant && !msg.tool_calls.is_empty() {
        let calls = msg
            .tool_calls
            .iter()
            .map(|c| serde_json::to_value(WireToolCall(c)))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        v["tool_calls"] = Value::Array(calls);
    }
    if let Some(id) = &msg.tool_call_id {
        v["tool_call_id"] = json!(id);
    }
    Ok(v)
}

/// Non-streaming chat-completion result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub id: Option<String>,
    pub model: Option<String>,
    pub content: String,
    pub reasoning_content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub finish_reason: Option<String>,
    pub usage: Option<Usage>,
}

impl ChatResponse {
    /// Decode the `/chat/completions` JSON response.
    pub fn from_json(v: &Value) -> Result<Self> {
        let choice = v.pointer("/choices/0").ok_or_else(|| {
            Error::validation_with_context(
                "response has no choices",
                ErrorContext::new()
                    .with_field_path("choices")
                    .with_source("response_decoder"),
            )
        })?;
        let message = &choice["message"];

        let tool_calls = message["tool_calls"]
            .as_array()
            .map(|calls| {
                calls
                    .iter()
                    .map(|c| {
                        let raw = c["function"]["arguments"].as_str().unwrap_or("");
                        ToolCall {
                            id: c["id"].as_str().unwrap_or_default().to_string(),
                            name: c["function"]["name"].as_str().unwrap_or_default().to_string(),
                            arguments: serde_json::from_str(raw)
                                .unwrap_or_else(|_| Value::String(raw.to_string())),
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        let usage = match v.get("usage") {
            Some(u) if !u.is_null() => Some(serde_json::from_value(u.clone())?),
            _ => None,
        };

        Ok(Self {
            id: v["id"].as_str().map(str::to_string),
            model: v["model"].as_str().map(str::to_string),
            content: message["content"].as_str().unwrap_or_default().to_string(),
            reasoning_content: message["reasoning_content"].as_str().map(str::to_string),
            tool_calls,
            finish_reason: choice["finish_reason"].as_str().map(str::to_string),
            usage,
        })
    }

    /// The assistant message to append to the conversation history.
    pub fn to_message(&self) -> Message {
        if self.tool_calls.is_empty() {
            Message::assistant(self.content.clone())
        } else {
            let mut m = Message::assistant_tool_calls(self.tool_calls.clone());
            m.content = self.content.clone();
            m
        }
    }
}
