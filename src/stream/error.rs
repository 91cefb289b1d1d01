//! Stream session errors.

use super::boundary::CancelBoundary;
use super::session::SessionState;
use thiserror::Error;

/// Errors raised while consuming a fragment stream.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The upstream source failed or was closed. Terminal for the session.
    #[error("stream source failed: {0}")]
    Source(#[source] Box<crate::Error>),

    /// The caller stopped the stream. A normal terminal state, not a failure.
    #[error("cancelled by user: {reason}")]
    CancelledByUser { reason: String },

    /// A text-ending boundary was evaluated with nothing accumulated yet.
    #[error("cannot evaluate {boundary} boundary against empty text")]
    InvalidBoundaryState { boundary: CancelBoundary },

    /// The session already reached a terminal state.
    #[error("session already finalized as {state}")]
    SessionFinalized { state: SessionState },
}

impl StreamError {
    pub fn source_error(err: crate::Error) -> Self {
        StreamError::Source(Box::new(err))
    }

    /// Cancellation is an outcome, not a failure.
    pub fn is_failure(&self) -> bool {
        !matches!(self, StreamError::CancelledByUser { .. })
    }
}
