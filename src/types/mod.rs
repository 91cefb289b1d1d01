//! 类型系统模块：定义聊天补全接口的核心数据类型。
//!
//! # Types Module
//!
//! Strongly-typed representations of the chat-completion primitives shared by
//! the client, the stream consumer and the application helpers.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Message`] | Chat message with role and content |
//! | [`Conversation`] | Titled message history for export and search |
//! | [`MessageRole`] | Message role (system, user, assistant, tool) |
//! | [`ChatRequest`] | Request body for `/chat/completions` |
//! | [`ChatResponse`] | Decoded non-streaming response |
//! | [`StreamFragment`] | One increment of a streamed completion |
//! | [`ToolCall`] | Function/tool call from model response |
//! | [`ToolDefinition`] | Tool definition for model context |
//!
//! ## Example
//!
//! ```rust
//! use deepseek_kit::types::{ChatRequest, Message, ToolDefinition};
//! use serde_json::json;
//!
//! let tool = ToolDefinition::function("get_weather", "Get current weather for a location")
//!     .parameters(json!({
//!         "type": "object",
//!         "properties": {"location": {"type": "string"}},
//!         "required": ["location"]
//!     }));
//!
//! let request = ChatRequest::new(vec![
//!     Message::system("You are a helpful assistant"),
//!     Message::user("What's the weather in Oslo?"),
//! ])
//! .tools(vec![tool]);
//! assert!(request.validate().is_ok());
//! ```

pub mod conversation;
pub mod events;
pub mod message;
pub mod request;
pub mod tool;

pub use conversation::Conversation;
pub use events::StreamFragment;
pub use message::{Message, MessageRole};
pub use request::{ChatRequest, ChatResponse, Usage, DEFAULT_MODEL, REASONER_MODEL};
pub use tool::{FunctionDefinition, ToolCall, ToolCallDelta, ToolDefinition};
