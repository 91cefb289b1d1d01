use crate::pipeline::event_map::ChunkMapper;
use crate::pipeline::{Pipeline, PipelineError};
use crate::types::StreamFragment;
use futures::StreamExt;
use serde_json::json;

#[test]
fn test_mapper_extracts_content_and_reasoning() {
    let mapper = ChunkMapper::new();
    let f = mapper
        .map_chunk(&json!({
            "choices": [{"delta": {"content": "Hi", "reasoning_content": "hmm"}, "finish_reason": null}]
        }))
        .unwrap()
        .unwrap();
    assert_eq!(f.content.as_deref(), Some("Hi"));
    assert_eq!(f.reasoning.as_deref(), Some("hmm"));
    assert!(!f.is_terminal());
}

#[test]
fn test_mapper_drops_role_only_chunks() {
    let mapper = ChunkMapper::new();
    let out = mapper
        .map_chunk(&json!({"choices": [{"delta": {"role": "assistant", "content": ""}}]}))
        .unwrap();
    assert!(out.is_none());
}

#[test]
fn test_mapper_finish_and_usage() {
    let mapper = ChunkMapper::new();
    let f = mapper
        .map_chunk(&json!({
            "choices": [{"delta": {}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 4, "completion_tokens": 6, "total_tokens": 10}
        }))
        .unwrap()
        .unwrap();
    assert_eq!(f.finish_reason.as_deref(), Some("stop"));
    assert_eq!(f.usage.unwrap().total_tokens, 10);
}

#[test]
fn test_mapper_tool_call_deltas() {
    let mapper = ChunkMapper::new();
    let f = mapper
        .map_chunk(&json!({
            "choices": [{"delta": {"tool_calls": [{
                "index": 0, "id": "call_1", "type": "function",
                "function": {"name": "get_weather", "arguments": "{\"lo"}
            }]}}]
        }))
        .unwrap()
        .unwrap();
    assert_eq!(f.tool_calls.len(), 1);
    assert_eq!(f.tool_calls[0].id.as_deref(), Some("call_1"));
    assert_eq!(f.tool_calls[0].arguments.as_deref(), Some("{\"lo"));
}

#[test]
fn test_mapper_surfaces_inline_errors() {
    let mapper = ChunkMapper::new();
    let err = mapper
        .map_chunk(&json!({"error": {"message": "overloaded"}}))
        .unwrap_err();
    assert!(matches!(err, PipelineError::Upstream(m) if m == "overloaded"));
}

#[tokio::test]
async fn test_pipeline_end_to_end() {
    let chunks = vec![
        "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"},\"index\":0}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"Deep\"},\"index\":0}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"Seek\"},\"index\":0}]}\n\n",
        "data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\",\"index\":0}]}\n\n",
        "data: [DONE]\n\n",
    ];
    let bytes_stream = futures::stream::iter(chunks)
        .map(|s| Ok::<bytes::Bytes, crate::Error>(bytes::Bytes::from(s)));

    let fragments: Vec<StreamFragment> = Pipeline::sse()
        .process_stream(Box::pin(bytes_stream))
        .await
        .unwrap()
        .map(|r| r.unwrap())
        .collect()
        .await;

    let text: String = fragments.iter().map(|f| f.content_str()).collect();
    assert_eq!(text, "DeepSeek");
    assert_eq!(fragments.len(), 3);
    assert!(fragments.last().unwrap().is_terminal());
}
