//! 错误日志：对运行时错误分类并保留最近的记录。
//!
//! # Error Log
//!
//! A bounded in-memory record of failures, each classified into an
//! [`ErrorCategory`] and mirrored to `tracing` as it is recorded.
//!
//! ```rust
//! use deepseek_kit::error_log::{ErrorCategory, ErrorLog};
//! use deepseek_kit::Error;
//!
//! let log = ErrorLog::new(100);
//! log.record(&Error::runtime("socket closed"), Some("weather lookup"));
//! assert_eq!(log.by_category(ErrorCategory::Unknown).len(), 1);
//! ```

use crate::pipeline::PipelineError;
use crate::stream::StreamError;
use crate::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{PoisonError, RwLock};
use tracing::{error, warn};

pub const DEFAULT_CAPACITY: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Network,
    Authentication,
    RateLimit,
    Server,
    Parse,
    Stream,
    Configuration,
    Unknown,
}

impl ErrorCategory {
    pub fn classify(err: &Error) -> Self {
        match err {
            Error::Transport(_) => Self::Network,
            Error::Remote { status, .. } => match *status {
                401 | 402 | 403 => Self::Authentication,
                429 => Self::RateLimit,
                400 | 404 | 422 => Self::Configuration,
                500..=599 => Self::Server,
                _ => Self::Unknown,
            },
            Error::Configuration { .. } | Error::Validation { .. } => Self::Configuration,
            Error::Serialization(_) | Error::Extract(_) => Self::Parse,
            Error::Pipeline(PipelineError::Upstream(_)) => Self::Server,
            Error::Pipeline(_) => Self::Parse,
            Error::Stream(StreamError::Source(inner)) => Self::classify(inner),
            Error::Stream(_) => Self::Stream,
            Error::Io(_) | Error::Runtime { .. } => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Authentication => "authentication",
            Self::RateLimit => "rate_limit",
            Self::Server => "server",
            Self::Parse => "parse",
            Self::Stream => "stream",
            Self::Configuration => "configuration",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub category: ErrorCategory,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Most recent `capacity` errors, oldest first.
pub struct ErrorLog {
    entries: RwLock<VecDeque<ErrorEntry>>,
    capacity: usize,
}

impl ErrorLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&self, err: &Error, context: Option<&str>) -> ErrorEntry {
        self.record_message(ErrorCategory::classify(err), err.to_string(), context)
    }

    pub fn record_message(
        &self,
        category: ErrorCategory,
        message: impl Into<String>,
        context: Option<&str>,
    ) -> ErrorEntry {
        let entry = ErrorEntry {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            category,
            message: message.into(),
            context: context.map(str::to_string),
        };
        match category {
            ErrorCategory::Server | ErrorCategory::Unknown => {
                error!(category = %category, context = ?entry.context, "{}", entry.message)
            }
            _ => warn!(category = %category, context = ?entry.context, "{}", entry.message),
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.push_back(entry.clone());
        while entries.len() > self.capacity {
            entries.pop_front();
        }
        entry
    }

    pub fn entries(&self) -> Vec<ErrorEntry> {
        self.read().iter().cloned().collect()
    }

    pub fn by_category(&self, category: ErrorCategory) -> Vec<ErrorEntry> {
        self.read()
            .iter()
            .filter(|e| e.category == category)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(&self.entries())?)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, VecDeque<ErrorEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ErrorLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ExtractError;

    fn remote(status: u16) -> Error {
        let (class, retryable) = crate::transport::classify_status(status);
        Error::Remote {
            status,
            class: class.to_string(),
            message: "x".into(),
            retryable,
            retry_after_ms: None,
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(ErrorCategory::classify(&remote(401)), ErrorCategory::Authentication);
        assert_eq!(ErrorCategory::classify(&remote(429)), ErrorCategory::RateLimit);
        assert_eq!(ErrorCategory::classify(&remote(503)), ErrorCategory::Server);
        assert_eq!(ErrorCategory::classify(&remote(422)), ErrorCategory::Configuration);
        assert_eq!(
            ErrorCategory::classify(&Error::Extract(ExtractError::NotFound { field: "score" })),
            ErrorCategory::Parse
        );
        let wrapped = Error::Stream(StreamError::source_error(remote(500)));
        assert_eq!(ErrorCategory::classify(&wrapped), ErrorCategory::Server);
        let cancelled = Error::Stream(StreamError::CancelledByUser { reason: "stop".into() });
        assert_eq!(ErrorCategory::classify(&cancelled), ErrorCategory::Stream);
    }

    #[test]
    fn test_bounded_and_ordered() {
        let log = ErrorLog::new(2);
        log.record_message(ErrorCategory::Network, "a", None);
        log.record_message(ErrorCategory::Parse, "b", Some("extract"));
        log.record_message(ErrorCategory::Network, "c", None);

        let messages: Vec<_> = log.entries().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["b", "c"]);
        assert_eq!(log.by_category(ErrorCategory::Network).len(), 1);

        let json: serde_json::Value = serde_json::from_str(&log.to_json().unwrap()).unwrap();
        assert_eq!(json[0]["category"], "parse");
        assert_eq!(json[0]["context"], "extract");

        log.clear();
        assert!(log.is_empty());
    }
}
