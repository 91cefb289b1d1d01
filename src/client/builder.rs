use super::config::ClientConfig;
use super::core::DeepSeekClient;
use crate::cache::{CacheConfig, CacheManager, MemoryCache};
use crate::pipeline::Pipeline;
use crate::stream::ConsumerConfig;
use crate::transport::HttpTransport;
use crate::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Builder for [`DeepSeekClient`].
///
/// Starts from [`ClientConfig::from_env`]; explicit setters win over the
/// environment.
pub struct DeepSeekClientBuilder {
    config: ClientConfig,
    consumer: ConsumerConfig,
    cache: Option<Arc<CacheManager>>,
    max_inflight: Option<usize>,
}

impl DeepSeekClientBuilder {
    pub fn new() -> Self {
        Self::with_config(ClientConfig::from_env())
    }

    pub fn with_config(config: ClientConfig) -> Self {
        Self {
            config,
            consumer: ConsumerConfig::default(),
            cache: None,
            max_inflight: None,
        }
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    /// Override the API base URL (mock servers, self-hosted gateways).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn proxy(mut self, url: impl Into<String>) -> Self {
        self.config.proxy_url = Some(url.into());
        self
    }

    pub fn consumer_config(mut self, consumer: ConsumerConfig) -> Self {
        self.consumer = consumer;
        self
    }

    /// Cache non-streaming completions in memory for `ttl`.
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = Some(Arc::new(CacheManager::new(
            CacheConfig::new().with_ttl(ttl).with_key_prefix("chat"),
            Box::new(MemoryCache::new()),
        )));
        self
    }

    pub fn cache(mut self, cache: Arc<CacheManager>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Limit concurrent requests and sessions. A streaming session holds its
    /// permit until it reaches a terminal state.
    pub fn max_inflight(mut self, n: usize) -> Self {
        self.max_inflight = Some(n.max(1));
        self
    }

    pub fn build(self) -> Result<DeepSeekClient> {
        self.config.validate()?;
        let transport = Arc::new(HttpTransport::new(&self.config)?);
        let max_inflight = self.max_inflight.or_else(|| {
            std::env::var("DEEPSEEK_MAX_INFLIGHT")
                .ok()?
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
        });

        Ok(DeepSeekClient {
            model: self.config.model.clone(),
            config: self.config,
            transport,
            pipeline: Arc::new(Pipeline::sse()),
            consumer: self.consumer,
            cache: self.cache,
            inflight: max_inflight.map(|n| Arc::new(Semaphore::new(n))),
        })
    }
}

impl Default for DeepSeekClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
