//! # deepseek-kit
//!
//! DeepSeek 聊天补全接口的 Rust 客户端：可中断的流式消费、工具调用与结果缓存。
//!
//! A Rust client for the DeepSeek chat-completion API, built around an
//! interruptible stream consumer.
//!
//! ## Overview
//!
//! Streamed completions arrive as an ordered sequence of text fragments. The
//! [`stream`] module accumulates them into a session the caller can pause,
//! resume or cancel at a word, sentence or paragraph boundary, so partial
//! output stays readable. Around that core sit a thin HTTP client, function
//! calling helpers, a TTL cache and small application utilities.
//!
//! ## Key Features
//!
//! - **Interruptible streaming**: [`StreamConsumer`] with pause/resume and boundary-aware cancellation
//! - **Client**: [`DeepSeekClient`] for `chat`, `chat_stream` and background sessions
//! - **Function calling**: [`tools::ToolRegistry`] and a cached `get_weather` tool
//! - **Caching**: TTL cache with pluggable backends via the [`cache`] module
//! - **Extraction**: fallible heuristics for steps, scores and risks in [`extract`]
//! - **Export and search** over saved conversations
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use deepseek_kit::stream::CancelBoundary;
//! use deepseek_kit::{ChatRequest, DeepSeekClient};
//!
//! #[tokio::main]
//! async fn main() -> deepseek_kit::Result<()> {
//!     let client = DeepSeekClient::builder().api_key("sk-...").build()?;
//!
//!     let handle = client
//!         .start_session(ChatRequest::prompt("Tell me about the Rust borrow checker."))
//!         .await?;
//!     handle.control().cancel(CancelBoundary::AfterSentence, "enough");
//!
//!     let session = handle.wait().await?;
//!     println!("{} ({})", session.buffer(), session.state());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`stream`] | Interruptible stream consumer and cancellation boundaries |
//! | [`client`] | DeepSeek client, configuration and session handles |
//! | [`pipeline`] | SSE decoding and chunk mapping |
//! | [`transport`] | HTTP transport and status classification |
//! | [`types`] | Messages, requests, responses, fragments, tools |
//! | [`tools`] | Tool trait, registry, weather tool |
//! | [`cache`] | TTL cache with pluggable backends |
//! | [`extract`] | Heuristic parsing of model output |
//! | [`export`] | Conversation export (JSON, Markdown, text, HTML) |
//! | [`error_log`] | Classified, bounded error log |
//! | [`search`] | Search over saved conversations |

pub mod cache;
pub mod client;
pub mod error_log;
pub mod export;
pub mod extract;
pub mod pipeline;
pub mod search;
pub mod stream;
pub mod tools;
pub mod transport;
pub mod types;
pub mod utils;

// Re-export main types for convenience
pub use client::{ClientConfig, DeepSeekClient, DeepSeekClientBuilder, SessionHandle};
pub use stream::{CancelBoundary, SessionState, StreamConsumer, StreamControl, StreamSession};
pub use types::{
    ChatRequest, ChatResponse, Conversation, Message, MessageRole, StreamFragment, ToolCall,
};

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A specialized Result for pipeline operations
pub type PipeResult<T> = std::result::Result<T, Error>;

/// A unified pinned, boxed stream that emits `PipeResult<T>`
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = PipeResult<T>> + Send + 'a>>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
