use crate::types::DEFAULT_MODEL;
use crate::{Error, ErrorContext, Result};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection settings for [`DeepSeekClient`](super::DeepSeekClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub proxy_url: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            pool_max_idle_per_host: 8,
            proxy_url: None,
        }
    }
}

impl ClientConfig {
    /// Read settings from the environment.
    ///
    /// - `DEEPSEEK_API_KEY`
    /// - `DEEPSEEK_BASE_URL` (default `https://api.deepseek.com`)
    /// - `DEEPSEEK_MODEL` (default `deepseek-chat`)
    /// - `DEEPSEEK_HTTP_TIMEOUT_SECS` (default 60)
    /// - `DEEPSEEK_PROXY_URL`
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(key) = env_non_empty("DEEPSEEK_API_KEY") {
            cfg.api_key = Some(key);
        }
        if let Some(url) = env_non_empty("DEEPSEEK_BASE_URL") {
            cfg.base_url = url;
        }
        if let Some(model) = env_non_empty("DEEPSEEK_MODEL") {
            cfg.model = model;
        }
        if let Some(secs) = env_non_empty("DEEPSEEK_HTTP_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|s| *s > 0)
        {
            cfg.timeout = Duration::from_secs(secs);
        }
        cfg.proxy_url = env_non_empty("DEEPSEEK_PROXY_URL");
        cfg
    }

    pub fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.base_url).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid base URL: {}", e),
                ErrorContext::new()
                    .with_field_path("config.base_url")
                    .with_details(self.base_url.clone()),
            )
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::configuration_with_context(
                format!("unsupported URL scheme '{}'", parsed.scheme()),
                ErrorContext::new().with_field_path("config.base_url"),
            ));
        }
        if let Some(proxy) = &self.proxy_url {
            url::Url::parse(proxy).map_err(|e| {
                Error::configuration_with_context(
                    format!("invalid proxy URL: {}", e),
                    ErrorContext::new().with_field_path("config.proxy_url"),
                )
            })?;
        }
        if self.model.trim().is_empty() {
            return Err(Error::configuration_with_context(
                "model must not be empty",
                ErrorContext::new().with_field_path("config.model"),
            ));
        }
        Ok(())
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
