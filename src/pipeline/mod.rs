//! 流水线处理模块：将 SSE 字节流解码为流式片段。
//!
//! # Streaming Pipeline
//!
//! Turns the raw byte stream of a streamed chat completion into
//! [`StreamFragment`]s the [`stream`](crate::stream) consumer understands.
//!
//! ```text
//! Raw Bytes → SseDecoder → JSON chunks → ChunkMapper → StreamFragment
//! ```
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`Pipeline`] | Decoder + mapper pair |
//! | [`Decoder`] | Trait for byte-stream decoding |
//! | [`Mapper`] | Trait for chunk-to-fragment mapping |
//! | [`decode::SseDecoder`] | Server-sent events decoder |
//! | [`event_map::ChunkMapper`] | OpenAI-compatible chunk mapper |

pub mod decode;
pub mod event_map;

#[cfg(test)]
mod tests;

use crate::types::StreamFragment;
use crate::{BoxStream, PipeResult};

/// Decoder trait for stream decoding
#[async_trait::async_trait]
pub trait Decoder: Send + Sync {
    /// Decode a byte stream into JSON values
    async fn decode_stream(
        &self,
        input: BoxStream<'static, bytes::Bytes>,
    ) -> PipeResult<BoxStream<'static, serde_json::Value>>;
}

/// Final stage: JSON chunks to fragments
#[async_trait::async_trait]
pub trait Mapper: Send + Sync {
    async fn map(
        &self,
        input: BoxStream<'static, serde_json::Value>,
    ) -> PipeResult<BoxStream<'static, StreamFragment>>;
}

/// Pipeline error types
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Decoder error: {0}")]
    Decoder(String),

    #[error("Event mapper error: {0}")]
    EventMapper(String),

    /// The server reported an error inside the event stream.
    #[error("Upstream stream error: {0}")]
    Upstream(String),
}

/// Pipeline that processes streaming responses
pub struct Pipeline {
    decoder: Box<dyn Decoder>,
    mapper: Box<dyn Mapper>,
}

impl Pipeline {
    pub fn new(decoder: Box<dyn Decoder>, mapper: Box<dyn Mapper>) -> Self {
        Self { decoder, mapper }
    }

    /// SSE decoding with OpenAI-compatible chunk mapping.
    pub fn sse() -> Self {
        Self::new(
            Box::new(decode::SseDecoder::new()),
            Box::new(event_map::ChunkMapper::new()),
        )
    }

    /// Process a byte stream through the pipeline
    pub async fn process_stream(
        &self,
        input: BoxStream<'static, bytes::Bytes>,
    ) -> PipeResult<BoxStream<'static, StreamFragment>> {
        let frames = self.decoder.decode_stream(input).await?;
        self.mapper.map(frames).await
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::sse()
    }
}
