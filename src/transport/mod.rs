//! HTTP transport for the chat-completion API.

mod http;

pub use http::{classify_status, HttpTransport, TransportError};
