//! Cache key generation.

use crate::types::ChatRequest;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub hash: String,
    pub model: Option<String>,
}

impl CacheKey {
    pub fn new(hash: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            model: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn as_str(&self) -> &str {
        &self.hash
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hash)
    }
}

impl From<&str> for CacheKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CacheKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Derives stable keys for chat requests: identical model, messages and
/// sampling parameters hash to the same key.
#[derive(Debug, Clone)]
pub struct CacheKeyGenerator {
    include_temperature: bool,
    salt: Option<String>,
}

impl CacheKeyGenerator {
    pub fn new() -> Self {
        Self {
            include_temperature: true,
            salt: None,
        }
    }

    pub fn with_salt(mut self, salt: impl Into<String>) -> Self {
        self.salt = Some(salt.into());
        self
    }

    pub fn ignore_temperature(mut self) -> Self {
        self.include_temperature = false;
        self
    }

    pub fn generate(&self, request: &ChatRequest) -> CacheKey {
        let mut parts: BTreeMap<&str, String> = BTreeMap::new();
        parts.insert("model", request.model.clone());
        if self.include_temperature {
            if let Some(t) = request.temperature {
                parts.insert("temperature", format!("{:.2}", t));
            }
        }
        if let Some(m) = request.max_tokens {
            parts.insert("max_tokens", m.to_string());
        }
        parts.insert(
            "messages",
            serde_json::to_string(&request.messages).unwrap_or_default(),
        );
        if !request.tools.is_empty() {
            parts.insert(
                "tools",
                serde_json::to_string(&request.tools).unwrap_or_default(),
            );
        }
        if let Some(ref s) = self.salt {
            parts.insert("salt", s.clone());
        }
        let canonical = serde_json::to_string(&parts).unwrap_or_default();

        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        let hash: String = hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();
        CacheKey::new(hash).with_model(request.model.clone())
    }
}

impl Default for CacheKeyGenerator {
    fn default() -> Self {
        Self::new()
    }
}
