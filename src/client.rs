//! DeepSeek chat-completion client.
//!
//! Small public surface: build a [`DeepSeekClient`], then `chat`, `chat_stream`
//! or `start_session`. Implementation details are split into submodules under
//! `src/client/`.

pub mod builder;
pub mod config;
pub mod core;
pub mod session;

pub use builder::DeepSeekClientBuilder;
pub use config::ClientConfig;
pub use core::{DeepSeekClient, ModelInfo};
pub use session::SessionHandle;
