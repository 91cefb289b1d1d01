use super::builder::DeepSeekClientBuilder;
use super::config::ClientConfig;
use super::session::SessionHandle;
use crate::cache::{CacheKeyGenerator, CacheManager};
use crate::pipeline::Pipeline;
use crate::stream::{ConsumerConfig, StreamConsumer};
use crate::transport::HttpTransport;
use crate::types::{ChatRequest, ChatResponse, StreamFragment};
use crate::{BoxStream, Error, ErrorContext, Result};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info};
use uuid::Uuid;

const CHAT_PATH: &str = "/chat/completions";
const MODELS_PATH: &str = "/models";

/// A model listed by `GET /models`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    #[serde(default)]
    pub owned_by: Option<String>,
}

/// Chat-completion client for the DeepSeek API.
pub struct DeepSeekClient {
    pub(crate) config: ClientConfig,
    pub(crate) model: String,
    pub(crate) transport: Arc<HttpTransport>,
    pub(crate) pipeline: Arc<Pipeline>,
    pub(crate) consumer: ConsumerConfig,
    pub(crate) cache: Option<Arc<CacheManager>>,
    pub(crate) inflight: Option<Arc<Semaphore>>,
}

impl DeepSeekClient {
    /// Client configured from the environment.
    pub fn new() -> Result<Self> {
        DeepSeekClientBuilder::new().build()
    }

    pub fn builder() -> DeepSeekClientBuilder {
        DeepSeekClientBuilder::new()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Requests built with [`ChatRequest::prompt`] and friends use the
    /// default model; swap it for the client's configured one.
    fn prepare(&self, mut request: ChatRequest, stream: bool) -> Result<ChatRequest> {
        if request.model.is_empty() || request.model == crate::types::DEFAULT_MODEL {
            request.model = self.model.clone();
        }
        request.stream = stream;
        request.validate()?;
        Ok(request)
    }

    async fn acquire(&self) -> Result<Option<OwnedSemaphorePermit>> {
        match &self.inflight {
            Some(sem) => sem.clone().acquire_owned().await.map(Some).map_err(|_| {
                Error::runtime_with_context(
                    "inflight limiter closed",
                    ErrorContext::new().with_source("deepseek_client"),
                )
            }),
            None => Ok(None),
        }
    }

    /// Single non-streaming completion.
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let request = self.prepare(request, false)?;
        let _permit = self.acquire().await?;
        let body = request.to_body()?;
        info!(model = %request.model, messages = request.messages.len(), "chat request");
        let value = self.transport.post_json(CHAT_PATH, &body).await?;
        ChatResponse::from_json(&value)
    }

    /// Like [`chat`](Self::chat), but answers identical requests from the
    /// cache while the entry is fresh. Without a configured cache this is a
    /// plain `chat`.
    pub async fn chat_cached(&self, request: ChatRequest) -> Result<ChatResponse> {
        let Some(cache) = &self.cache else {
            debug!("no cache configured; sending request");
            return self.chat(request).await;
        };
        let request = self.prepare(request, false)?;
        let key = CacheKeyGenerator::new().generate(&request);
        if let Some(hit) = cache.get::<ChatResponse>(&key).await? {
            return Ok(hit);
        }
        let response = self.chat(request).await?;
        cache.set(&key, &response).await?;
        Ok(response)
    }

    /// Open a streamed completion and return its fragments.
    ///
    /// Dropping the stream closes the connection.
    pub async fn chat_stream(
        &self,
        request: ChatRequest,
    ) -> Result<BoxStream<'static, StreamFragment>> {
        let request = self.prepare(request, true)?;
        let permit = self.acquire().await?;
        let body = request.to_body()?;
        let request_id = Uuid::new_v4().to_string();
        info!(model = %request.model, request_id = %request_id, "chat stream request");

        let bytes = self
            .transport
            .post_stream(CHAT_PATH, &body, Some(&request_id))
            .await?;
        let fragments = self.pipeline.process_stream(bytes).await?;
        // The permit lives as long as the stream.
        let fragments = fragments.map(move |item| {
            let _held = &permit;
            item
        });
        Ok(Box::pin(fragments))
    }

    /// Stream `request` through a [`StreamConsumer`] on a background task.
    pub async fn start_session(&self, request: ChatRequest) -> Result<SessionHandle> {
        self.start_session_with(request, StreamConsumer::new(self.consumer.clone()))
            .await
    }

    /// Like [`start_session`](Self::start_session) with a caller-configured
    /// consumer (observer callback, shared control handle).
    pub async fn start_session_with(
        &self,
        request: ChatRequest,
        consumer: StreamConsumer,
    ) -> Result<SessionHandle> {
        let source = self.chat_stream(request).await?;
        let control = consumer.control();
        let updates = consumer.subscribe();
        let session_id = consumer.session_id().to_string();
        let task = tokio::spawn(consumer.consume(source));
        Ok(SessionHandle::new(session_id, control, updates, task))
    }

    pub async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let value = self.transport.get_json(MODELS_PATH).await?;
        let data = value.get("data").cloned().ok_or_else(|| {
            Error::validation_with_context(
                "model list has no data field",
                ErrorContext::new()
                    .with_field_path("data")
                    .with_source("deepseek_client"),
            )
        })?;
        Ok(serde_json::from_value(data)?)
    }
}
