//! Client integration tests against a local mockito server.

mod common;

use common::{content_chunk, finish_chunk, sse_body, MockServerFixture, API_KEY};
use deepseek_kit::stream::{CancelBoundary, ConsumerConfig, SessionState, StreamConsumer};
use deepseek_kit::{ChatRequest, DeepSeekClientBuilder, Error, Message};
use futures::StreamExt;
use mockito::Matcher;
use serde_json::json;
use std::io::Write;
use std::time::Duration;

#[tokio::test]
async fn test_chat_completion() {
    let mut fixture = MockServerFixture::new().await;
    let body = json!({
        "id": "chatcmpl-9",
        "model": "deepseek-reasoner",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": "Paris.",
                "reasoning_content": "The capital of France is Paris."
            },
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 5, "completion_tokens": 2, "total_tokens": 7}
    });
    let _m = fixture.mock_json_response(200, &body.to_string()).await;

    let resp = fixture
        .client()
        .chat(ChatRequest::prompt("Capital of France?"))
        .await
        .unwrap();
    assert_eq!(resp.content, "Paris.");
    assert_eq!(resp.reasoning_content.as_deref(), Some("The capital of France is Paris."));
    assert_eq!(resp.finish_reason.as_deref(), Some("stop"));
    assert_eq!(resp.usage.unwrap().total_tokens, 7);
}

#[tokio::test]
async fn test_chat_stream_fragments() {
    let mut fixture = MockServerFixture::new().await;
    let chunks = [
        content_chunk("Hello"),
        ": keep-alive".to_string(),
        content_chunk(" world"),
        finish_chunk("stop"),
    ];
    let refs: Vec<&str> = chunks.iter().map(String::as_str).collect();
    let _m = fixture.mock_sse_stream(&refs).await;

    let stream = fixture
        .client()
        .chat_stream(ChatRequest::prompt("hi"))
        .await
        .unwrap();
    let fragments: Vec<_> = stream.collect().await;
    let fragments: Vec<_> = fragments.into_iter().map(Result::unwrap).collect();

    assert_eq!(fragments.len(), 3);
    assert_eq!(fragments[0].content_str(), "Hello");
    assert_eq!(fragments[1].content_str(), " world");
    assert!(fragments[2].is_terminal());
    assert_eq!(fragments[2].usage.as_ref().unwrap().total_tokens, 12);
}

#[tokio::test]
async fn test_session_cancelled_at_sentence() {
    let mut fixture = MockServerFixture::new().await;
    let chunks = [
        content_chunk("Hello"),
        content_chunk(" world."),
        content_chunk(" More."),
        finish_chunk("stop"),
    ];
    let refs: Vec<&str> = chunks.iter().map(String::as_str).collect();
    let _m = fixture.mock_sse_stream(&refs).await;

    let consumer = StreamConsumer::new(ConsumerConfig::default());
    consumer
        .control()
        .cancel(CancelBoundary::AfterSentence, "one sentence is enough");

    let handle = fixture
        .client()
        .start_session_with(ChatRequest::prompt("greet"), consumer)
        .await
        .unwrap();
    let session = handle.wait().await.unwrap();

    assert_eq!(session.state(), SessionState::Cancelled);
    assert_eq!(session.buffer(), "Hello world.");
    assert_eq!(session.chunk_count(), 2);
    assert_eq!(session.cancel_reason(), Some("one sentence is enough"));
}

#[tokio::test]
async fn test_session_completes_with_tool_calls() {
    let mut fixture = MockServerFixture::new().await;
    let delta = |v: serde_json::Value| {
        json!({"choices": [{"index": 0, "delta": {"tool_calls": [v]}, "finish_reason": null}]})
            .to_string()
    };
    let chunks = [
        delta(json!({"index": 0, "id": "call_1", "function": {"name": "get_weather", "arguments": ""}})),
        delta(json!({"index": 0, "function": {"arguments": "{\"location\":"}})),
        delta(json!({"index": 0, "function": {"arguments": " \"Oslo\"}"}})),
        finish_chunk("tool_calls"),
    ];
    let refs: Vec<&str> = chunks.iter().map(String::as_str).collect();
    let _m = fixture.mock_sse_stream(&refs).await;

    let handle = fixture
        .client()
        .start_session(ChatRequest::prompt("weather in Oslo?"))
        .await
        .unwrap();
    let mut updates = handle.updates();
    let session = handle.wait().await.unwrap();

    assert_eq!(session.state(), SessionState::Complete);
    assert_eq!(session.tool_calls().len(), 1);
    assert_eq!(session.tool_calls()[0].name, "get_weather");
    assert_eq!(session.tool_calls()[0].arguments, json!({"location": "Oslo"}));
    assert_eq!(session.usage().map(|u| u.total_tokens), Some(12));
    assert!(updates.borrow_and_update().is_terminal());
}

#[tokio::test]
async fn test_slow_paused_stream_outlives_request_timeout() {
    let mut fixture = MockServerFixture::new().await;
    let first = format!("data: {}\n\n", content_chunk("Hello"));
    let rest = [content_chunk(" world."), finish_chunk("stop")];
    let refs: Vec<&str> = rest.iter().map(String::as_str).collect();
    let second = sse_body(&refs);
    let _m = fixture
        .server
        .mock("POST", "/chat/completions")
        .match_header("authorization", format!("Bearer {}", API_KEY).as_str())
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_chunked_body(move |w| {
            w.write_all(first.as_bytes())?;
            w.flush()?;
            // Longer than the client timeout below.
            std::thread::sleep(Duration::from_millis(700));
            w.write_all(second.as_bytes())
        })
        .create_async()
        .await;

    let mut config = fixture.config();
    config.timeout = Duration::from_millis(300);
    let client = DeepSeekClientBuilder::with_config(config).build().unwrap();

    let consumer = StreamConsumer::new(
        ConsumerConfig::new().with_pause_poll_interval(Duration::from_millis(10)),
    );
    let control = consumer.control();
    let mut updates = consumer.subscribe();
    let handle = client
        .start_session_with(ChatRequest::prompt("hi"), consumer)
        .await
        .unwrap();

    updates.wait_for(|s| s.chunk_count == 1).await.unwrap();
    control.pause();
    tokio::time::sleep(Duration::from_millis(900)).await;
    control.resume();

    let session = handle.wait().await.unwrap();
    assert_eq!(session.state(), SessionState::Complete, "{:?}", session.error());
    assert_eq!(session.buffer(), "Hello world.");
}

#[tokio::test]
async fn test_upstream_error_fails_session() {
    let mut fixture = MockServerFixture::new().await;
    let chunks = [
        content_chunk("Partial"),
        json!({"error": {"message": "model overloaded"}}).to_string(),
        content_chunk(" never seen"),
    ];
    let refs: Vec<&str> = chunks.iter().map(String::as_str).collect();
    let _m = fixture.mock_sse_stream(&refs).await;

    let session = fixture
        .client()
        .start_session(ChatRequest::prompt("hi"))
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(session.state(), SessionState::Failed);
    assert_eq!(session.buffer(), "Partial");
    assert_eq!(session.chunk_count(), 1);
    assert!(session.error().unwrap().to_string().contains("model overloaded"));
}

#[tokio::test]
async fn test_http_errors_are_classified() {
    let mut fixture = MockServerFixture::new().await;
    let _m = fixture
        .mock_json_response(401, r#"{"error":{"message":"Authentication Fails"}}"#)
        .await;

    let err = fixture
        .client()
        .chat(ChatRequest::prompt("hi"))
        .await
        .unwrap_err();
    match err {
        Error::Remote {
            status,
            class,
            message,
            retryable,
            ..
        } => {
            assert_eq!(status, 401);
            assert_eq!(class, "authentication");
            assert_eq!(message, "Authentication Fails");
            assert!(!retryable);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_rate_limit_retry_after() {
    let mut fixture = MockServerFixture::new().await;
    let _m = fixture
        .server
        .mock("POST", "/chat/completions")
        .with_status(429)
        .with_header("retry-after", "2")
        .with_body(r#"{"error":{"message":"slow down"}}"#)
        .create_async()
        .await;

    let err = fixture
        .client()
        .start_session(ChatRequest::prompt("hi"))
        .await
        .err()
        .unwrap();
    assert!(err.is_retryable());
    assert!(matches!(
        err,
        Error::Remote {
            status: 429,
            retry_after_ms: Some(2000),
            ..
        }
    ));
}

#[tokio::test]
async fn test_chat_cached_sends_once() {
    let mut fixture = MockServerFixture::new().await;
    let body = json!({
        "choices": [{"index": 0, "message": {"role": "assistant", "content": "42"}, "finish_reason": "stop"}]
    });
    let mock = fixture
        .server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::PartialJson(json!({"stream": false})))
        .with_status(200)
        .with_body(body.to_string())
        .expect(1)
        .create_async()
        .await;

    let client = fixture
        .builder()
        .cache_ttl(Duration::from_secs(60))
        .build()
        .unwrap();
    let request = ChatRequest::new(vec![Message::user("The answer?")]);
    let first = client.chat_cached(request.clone()).await.unwrap();
    let second = client.chat_cached(request).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(second.content, "42");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_list_models() {
    let mut fixture = MockServerFixture::new().await;
    let _m = fixture
        .server
        .mock("GET", "/models")
        .with_status(200)
        .with_body(
            json!({
                "object": "list",
                "data": [
                    {"id": "deepseek-chat", "object": "model", "owned_by": "deepseek"},
                    {"id": "deepseek-reasoner", "object": "model", "owned_by": "deepseek"}
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let models = fixture.client().list_models().await.unwrap();
    let ids: Vec<_> = models.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["deepseek-chat", "deepseek-reasoner"]);
}

#[tokio::test]
async fn test_invalid_request_rejected_before_sending() {
    let fixture = MockServerFixture::new().await;
    let err = fixture
        .client()
        .chat(ChatRequest::new(Vec::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
}
