//! Mock HTTP server setup for integration tests

#![allow(dead_code)]

use deepseek_kit::{ClientConfig, DeepSeekClient, DeepSeekClientBuilder};
use mockito::{Matcher, Mock, Server, ServerGuard};
use std::time::Duration;

pub const API_KEY: &str = "test-key";

/// Test fixture that manages a mock server
pub struct MockServerFixture {
    pub server: ServerGuard,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        Self {
            server: Server::new_async().await,
        }
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            api_key: Some(API_KEY.to_string()),
            base_url: self.server.url(),
            timeout: Duration::from_secs(5),
            ..Default::default()
        }
    }

    pub fn builder(&self) -> DeepSeekClientBuilder {
        DeepSeekClientBuilder::with_config(self.config())
    }

    pub fn client(&self) -> DeepSeekClient {
        self.builder().build().expect("client builds")
    }

    /// SSE response: each chunk becomes one `data:` frame, followed by `[DONE]`.
    pub async fn mock_sse_stream(&mut self, chunks: &[&str]) -> Mock {
        let body = sse_body(chunks);
        self.server
            .mock("POST", "/chat/completions")
            .match_header("authorization", format!("Bearer {}", API_KEY).as_str())
            .match_body(Matcher::PartialJson(serde_json::json!({"stream": true})))
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(body)
            .create_async()
            .await
    }

    pub async fn mock_json_response(&mut self, status: u16, body: &str) -> Mock {
        self.server
            .mock("POST", "/chat/completions")
            .with_status(status as usize)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }
}

pub fn sse_body(chunks: &[&str]) -> String {
    let mut body: String = chunks
        .iter()
        .map(|chunk| {
            if chunk.starts_with("data: ") || chunk.starts_with(':') {
                format!("{}\n\n", chunk)
            } else {
                format!("data: {}\n\n", chunk)
            }
        })
        .collect();
    body.push_str("data: [DONE]\n\n");
    body
}

/// `choices[0].delta.content` chunk.
pub fn content_chunk(text: &str) -> String {
    serde_json::json!({
        "id": "chatcmpl-1",
        "model": "deepseek-chat",
        "choices": [{"index": 0, "delta": {"content": text}, "finish_reason": null}]
    })
    .to_string()
}

pub fn finish_chunk(reason: &str) -> String {
    serde_json::json!({
        "id": "chatcmpl-1",
        "choices": [{"index": 0, "delta": {}, "finish_reason": reason}],
        "usage": {"prompt_tokens": 9, "completion_tokens": 3, "total_tokens": 12}
    })
    .to_string()
}
