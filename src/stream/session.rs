//! Stream session record and its read-only projection.

use super::error::StreamError;
use crate::types::{ToolCall, Usage};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a [`StreamSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Streaming,
    Paused,
    Cancelled,
    Complete,
    Failed,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Cancelled | SessionState::Complete | SessionState::Failed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Streaming => "streaming",
            SessionState::Paused => "paused",
            SessionState::Cancelled => "cancelled",
            SessionState::Complete => "complete",
            SessionState::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One request/response exchange as seen by the consumer.
///
/// Only the consumer mutates a session. Every mutator refuses to run once a
/// terminal state has been reached.
#[derive(Debug)]
pub struct StreamSession {
    id: String,
    buffer: String,
    reasoning: String,
    chunk_count: usize,
    state: SessionState,
    cancel_reason: Option<String>,
    error: Option<StreamError>,
    tool_calls: Vec<ToolCall>,
    usage: Option<Usage>,
}

impl StreamSession {
    pub fn new() -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            buffer: String::new(),
            reasoning: String::new(),
            chunk_count: 0,
            state: SessionState::Streaming,
            cancel_reason: None,
            error: None,
            tool_calls: Vec::new(),
            usage: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }

    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn cancel_reason(&self) -> Option<&str> {
        self.cancel_reason.as_deref()
    }

    pub fn error(&self) -> Option<&StreamError> {
        self.error.as_ref()
    }

    pub fn tool_calls(&self) -> &[ToolCall] {
        &self.tool_calls
    }

    pub fn usage(&self) -> Option<&Usage> {
        self.usage.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }

    fn ensure_open(&self) -> Result<(), StreamError> {
        if self.state.is_terminal() {
            return Err(StreamError::SessionFinalized { state: self.state });
        }
        Ok(())
    }

    /// Append one consumed fragment's text and count it.
    pub(crate) fn append(&mut self, text: &str, reasoning: Option<&str>) -> Result<(), StreamError> {
        self.ensure_open()?;
        self.buffer.push_str(text);
        if let Some(r) = reasoning {
            self.reasoning.push_str(r);
        }
        self.chunk_count += 1;
        Ok(())
    }

    /// Cut the text back to `len` bytes (a char boundary) before finalizing.
    pub(crate) fn truncate(&mut self, len: usize) -> Result<(), StreamError> {
        self.ensure_open()?;
        if self.buffer.is_char_boundary(len) {
            self.buffer.truncate(len);
        }
        Ok(())
    }

    pub(crate) fn set_usage(&mut self, usage: Usage) -> Result<(), StreamError> {
        self.ensure_open()?;
        self.usage = Some(usage);
        Ok(())
    }

    pub(crate) fn set_tool_calls(&mut self, calls: Vec<ToolCall>) -> Result<(), StreamError> {
        self.ensure_open()?;
        self.tool_calls = calls;
        Ok(())
    }

    /// Toggle between `Streaming` and `Paused`.
    pub(crate) fn set_paused(&mut self, paused: bool) -> Result<(), StreamError> {
        self.ensure_open()?;
        self.state = if paused {
            SessionState::Paused
        } else {
            SessionState::Streaming
        };
        Ok(())
    }

    pub(crate) fn complete(&mut self) -> Result<(), StreamError> {
        self.ensure_open()?;
        self.state = SessionState::Complete;
        Ok(())
    }

    pub(crate) fn cancel(&mut self, reason: impl Into<String>) -> Result<(), StreamError> {
        self.ensure_open()?;
        self.state = SessionState::Cancelled;
        self.cancel_reason = Some(reason.into());
        Ok(())
    }

    pub(crate) fn fail(&mut self, error: StreamError) -> Result<(), StreamError> {
        self.ensure_open()?;
        self.state = SessionState::Failed;
        self.error = Some(error);
        Ok(())
    }

    /// Read-only copy for observers.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id.clone(),
            state: self.state,
            buffer: self.buffer.clone(),
            reasoning: self.reasoning.clone(),
            chunk_count: self.chunk_count,
            cancel_reason: self.cancel_reason.clone(),
            error: self.error.as_ref().map(|e| e.to_string()),
        }
    }

    /// Collapse the session into its text, or the error that ended it.
    ///
    /// A cancelled session is a success carrying the partial text.
    pub fn into_result(self) -> Result<String, StreamError> {
        match (self.state, self.error) {
            (SessionState::Failed, Some(e)) => Err(e),
            _ => Ok(self.buffer),
        }
    }
}

impl Default for StreamSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer view of a session, published after every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub id: String,
    pub state: SessionState,
    pub buffer: String,
    pub reasoning: String,
    pub chunk_count: usize,
    pub cancel_reason: Option<String>,
    pub error: Option<String>,
}

impl SessionSnapshot {
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finalized_session_rejects_mutation() {
        let mut s = StreamSession::with_id("s1");
        s.append("Hi", None).unwrap();
        s.complete().unwrap();

        assert!(matches!(
            s.append("more", None),
            Err(StreamError::SessionFinalized {
                state: SessionState::Complete
            })
        ));
        assert!(s.cancel("late").is_err());
        assert!(s.set_paused(true).is_err());
        assert_eq!(s.buffer(), "Hi");
        assert_eq!(s.chunk_count(), 1);
        assert_eq!(s.cancel_reason(), None);
    }

    #[test]
    fn test_failed_session_keeps_partial_buffer() {
        let mut s = StreamSession::new();
        s.append("partial", None).unwrap();
        s.fail(StreamError::source_error(crate::Error::runtime("boom")))
            .unwrap();
        let snap = s.snapshot();
        assert_eq!(snap.state, SessionState::Failed);
        assert_eq!(snap.buffer, "partial");
        assert!(snap.error.unwrap().contains("boom"));
        assert!(s.into_result().is_err());
    }

    #[test]
    fn test_pause_toggles_state() {
        let mut s = StreamSession::new();
        s.set_paused(true).unwrap();
        assert_eq!(s.state(), SessionState::Paused);
        s.set_paused(false).unwrap();
        assert_eq!(s.state(), SessionState::Streaming);
    }
}
