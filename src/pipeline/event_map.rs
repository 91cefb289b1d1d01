//! Chunk mapping (JSON Value -> StreamFragment)
//!
//! Maps OpenAI-compatible `chat.completion.chunk` objects:
//!
//! ```text
//! {"choices":[{"delta":{"content":"..","reasoning_content":"..","tool_calls":[..]},
//!              "finish_reason":null}], "usage": {..}}
//! ```

use crate::pipeline::{Mapper, PipelineError};
use crate::types::{StreamFragment, ToolCallDelta, Usage};
use crate::{BoxStream, PipeResult};
use futures::StreamExt;
use serde_json::Value;

/// Mapper for OpenAI-compatible chunks. Frames that carry nothing are dropped.
#[derive(Debug, Default)]
pub struct ChunkMapper;

impl ChunkMapper {
    pub fn new() -> Self {
        Self
    }

    /// Map one chunk. `Ok(None)` for empty (keep-alive / role-only) chunks.
    pub fn map_chunk(&self, chunk: &Value) -> Result<Option<StreamFragment>, PipelineError> {
        if let Some(err) = chunk.get("error") {
            let message = err
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown stream error");
            return Err(PipelineError::Upstream(message.to_string()));
        }

        let choice = chunk.pointer("/choices/0");
        let delta = choice.and_then(|c| c.get("delta"));
        let text = |key: &str| {
            delta
                .and_then(|d| d.get(key))
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let tool_calls = match delta.and_then(|d| d.get("tool_calls")).and_then(|t| t.as_array()) {
            Some(calls) => calls
                .iter()
                .enumerate()
                .map(|(pos, c)| ToolCallDelta {
                    index: c
                        .get("index")
                        .and_then(|i| i.as_u64())
                        .map(|i| i as u32)
                        .unwrap_or(pos as u32),
                    id: c.get("id").and_then(|v| v.as_str()).map(str::to_string),
                    name: c
                        .pointer("/function/name")
                        .and_then(|v| v.as_str())
                        .map(str::to_string),
                    arguments: c
                        .pointer("/function/arguments")
                        .and_then(|v| v.as_str())
                        .map(str::to_string),
                })
                .collect(),
            None => Vec::new(),
        };

        let usage = match chunk.get("usage") {
            Some(u) if !u.is_null() => Some(
                serde_json::from_value::<Usage>(u.clone())
                    .map_err(|e| PipelineError::EventMapper(format!("invalid usage: {}", e)))?,
            ),
            _ => None,
        };

        let fragment = StreamFragment {
            content: text("content"),
            reasoning: text("reasoning_content"),
            tool_calls,
            finish_reason: choice
                .and_then(|c| c.get("finish_reason"))
                .and_then(|f| f.as_str())
                .map(str::to_string),
            usage,
        };

        Ok((!fragment.is_empty()).then_some(fragment))
    }
}

#[async_trait::async_trait]
impl Mapper for ChunkMapper {
    async fn map(
        &self,
        input: BoxStream<'static, Value>,
    ) -> PipeResult<BoxStream<'static, StreamFragment>> {
        let mapper = ChunkMapper;
        let stream = input.filter_map(move |item| {
            let out = match item {
                Ok(chunk) => match mapper.map_chunk(&chunk) {
                    Ok(Some(fragment)) => Some(Ok(fragment)),
                    Ok(None) => None,
                    Err(e) => Some(Err(crate::Error::Pipeline(e))),
                },
                Err(e) => Some(Err(e)),
            };
            futures::future::ready(out)
        });
        Ok(Box::pin(stream))
    }
}
