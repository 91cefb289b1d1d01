use crate::client::ClientConfig;
use crate::{BoxStream, Error, Result};
use bytes::Bytes;
use futures::TryStreamExt;
use reqwest::header::HeaderMap;
use reqwest::Proxy;
use std::time::Duration;
use tracing::debug;

pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    /// Whole-request limit for JSON calls; for streams it only bounds the
    /// wait for response headers.
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(config.timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            // Long-lived SSE connections benefit from keepalive pings.
            .http2_adaptive_window(true)
            .http2_keep_alive_interval(Some(Duration::from_secs(30)))
            .http2_keep_alive_timeout(Duration::from_secs(10));

        if let Some(proxy_url) = &config.proxy_url {
            let proxy = Proxy::all(proxy_url).map_err(|e| Error::Transport(TransportError::Http(e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            timeout: config.timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST a JSON body and decode the JSON response.
    pub async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let mut req = self
            .client
            .post(self.url(path))
            .json(body)
            .timeout(self.timeout);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        debug!(path, "POST");
        let resp = req
            .send()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))?;
        let resp = Self::check_status(resp).await?;
        resp.json()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))
    }

    /// POST a JSON body and return the raw SSE byte stream.
    ///
    /// Dropping the returned stream closes the connection.
    pub async fn post_stream(
        &self,
        path: &str,
        body: &serde_json::Value,
        request_id: Option<&str>,
    ) -> Result<BoxStream<'static, Bytes>> {
        let mut req = self
            .client
            .post(self.url(path))
            .json(body)
            .header("accept", "text/event-stream");
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        if let Some(id) = request_id {
            req = req.header("x-client-request-id", id);
        }
        debug!(path, request_id, "POST (stream)");

        // No deadline on the body: a stream may run, or sit paused, for
        // longer than any request timeout.
        let resp = tokio::time::timeout(self.timeout, req.send())
            .await
            .map_err(|_| {
                Error::Transport(TransportError::Other(format!(
                    "no response headers within {:?}",
                    self.timeout
                )))
            })?
            .map_err(|e| Error::Transport(TransportError::Http(e)))?;
        let resp = Self::check_status(resp).await?;

        let byte_stream = resp
            .bytes_stream()
            .map_err(|e| Error::Transport(TransportError::Http(e)));
        Ok(Box::pin(byte_stream))
    }

    pub async fn get_json(&self, path: &str) -> Result<serde_json::Value> {
        let mut req = self.client.get(self.url(path)).timeout(self.timeout);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        debug!(path, "GET");
        let resp = req
            .send()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))?;
        let resp = Self::check_status(resp).await?;
        resp.json()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))
    }

    async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let retry_after_ms = retry_after_ms(resp.headers());
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| {
                v.pointer("/error/message")
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
            })
            .unwrap_or(body);
        let (class, retryable) = classify_status(status.as_u16());
        Err(Error::Remote {
            status: status.as_u16(),
            class: class.to_string(),
            message,
            retryable,
            retry_after_ms,
        })
    }
}

/// Map an HTTP status to an error class and whether it is worth retrying.
pub fn classify_status(status: u16) -> (&'static str, bool) {
    match status {
        400 | 422 => ("invalid_request", false),
        401 => ("authentication", false),
        402 => ("quota_exhausted", false),
        403 => ("permission_denied", false),
        404 => ("not_found", false),
        408 => ("timeout", true),
        429 => ("rate_limited", true),
        503 => ("overloaded", true),
        500..=599 => ("server_error", true),
        _ => ("unknown", false),
    }
}

/// Only the `Retry-After: <seconds>` form is understood.
fn retry_after_ms(headers: &HeaderMap) -> Option<u32> {
    let raw = headers.get("retry-after")?.to_str().ok()?.trim();
    let secs: u32 = raw.parse().ok()?;
    Some(secs.saturating_mul(1000))
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(401), ("authentication", false));
        assert_eq!(classify_status(402), ("quota_exhausted", false));
        assert_eq!(classify_status(429), ("rate_limited", true));
        assert_eq!(classify_status(503), ("overloaded", true));
        assert_eq!(classify_status(502), ("server_error", true));
        assert_eq!(classify_status(418), ("unknown", false));
    }

    #[test]
    fn test_retry_after_seconds_only() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", "3".parse().unwrap());
        assert_eq!(retry_after_ms(&headers), Some(3000));

        headers.insert("retry-after", "Wed, 21 Oct 2015 07:28:00 GMT".parse().unwrap());
        assert_eq!(retry_after_ms(&headers), None);
    }
}
