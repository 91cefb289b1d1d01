//! The interruptible stream consumer.
//!
//! ```text
//! Streaming ⇄ Paused
//!     │
//!     ├── source ends / finish marker ──► Complete
//!     ├── boundary satisfied ───────────► Cancelled
//!     ├── source ends, cut pending ─────► Cancelled (cut back to last boundary)
//!     └── source error ─────────────────► Failed
//! ```
//!
//! The consumer owns its [`StreamSession`] (single writer). Observers get
//! [`SessionSnapshot`]s through a `watch` channel and an optional callback,
//! both updated before the consumer moves on to the next fragment.

use super::boundary::{BoundaryDecision, CancelBoundary};
use super::control::{CancellationRequest, StreamControl};
use super::error::StreamError;
use super::session::{SessionSnapshot, StreamSession};
use crate::types::StreamFragment;
use crate::utils::ToolCallAssembler;
use futures::{Stream, StreamExt};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);
const MAX_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Consumer tuning knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerConfig {
    /// How long the pause gate sleeps between checks for resume/cancel.
    pub pause_poll_interval: Duration,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            pause_poll_interval: Duration::from_millis(50),
        }
    }
}

impl ConsumerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clamped to 1ms..=1s.
    pub fn with_pause_poll_interval(mut self, interval: Duration) -> Self {
        self.pause_poll_interval = interval.clamp(MIN_POLL_INTERVAL, MAX_POLL_INTERVAL);
        self
    }
}

type Observer = Box<dyn Fn(&SessionSnapshot) + Send + Sync>;

/// Drives one [`StreamSession`] from a fragment source to a terminal state.
pub struct StreamConsumer {
    config: ConsumerConfig,
    control: StreamControl,
    session: StreamSession,
    updates: watch::Sender<SessionSnapshot>,
    observer: Option<Observer>,
    tool_calls: ToolCallAssembler,
}

impl StreamConsumer {
    pub fn new(config: ConsumerConfig) -> Self {
        Self::with_session(config, StreamSession::new())
    }

    pub fn with_session(config: ConsumerConfig, session: StreamSession) -> Self {
        let (updates, _) = watch::channel(session.snapshot());
        Self {
            config,
            control: StreamControl::new(),
            session,
            updates,
            observer: None,
            tool_calls: ToolCallAssembler::new(),
        }
    }

    /// Use an existing control handle instead of a fresh one.
    pub fn with_control(mut self, control: StreamControl) -> Self {
        self.control = control;
        self
    }

    /// Invoke `f` with every published snapshot.
    pub fn on_update<F>(mut self, f: F) -> Self
    where
        F: Fn(&SessionSnapshot) + Send + Sync + 'static,
    {
        self.observer = Some(Box::new(f));
        self
    }

    pub fn control(&self) -> StreamControl {
        self.control.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.updates.subscribe()
    }

    pub fn session_id(&self) -> &str {
        self.session.id()
    }

    /// Consume `source` until it completes, fails, or a cancellation takes effect.
    ///
    /// The source is dropped as soon as the consumer stops reading it, which
    /// closes the underlying request.
    pub async fn consume<S>(mut self, source: S) -> StreamSession
    where
        S: Stream<Item = crate::Result<StreamFragment>> + Send,
    {
        tokio::pin!(source);
        info!(session = %self.session.id(), "stream session started");
        self.publish();

        loop {
            self.pause_gate().await;

            if let Some(req) = self.take_immediate() {
                self.finish_cancelled(req.reason);
                break;
            }

            // `None` here means an Immediate cancellation arrived while waiting.
            let next = tokio::select! {
                biased;
                _ = self.control.immediate_requested() => None,
                item = source.next() => Some(item),
            };
            let Some(item) = next else {
                continue;
            };

            match item {
                None => {
                    self.finish_source_end();
                    break;
                }
                Some(Err(e)) => {
                    self.finish_failed(e);
                    break;
                }
                Some(Ok(fragment)) => {
                    if self.on_fragment(fragment) {
                        break;
                    }
                }
            }
        }

        debug!(
            session = %self.session.id(),
            state = %self.session.state(),
            chunks = self.session.chunk_count(),
            "stream session finished"
        );
        self.session
    }

    /// Returns true once the session reached a terminal state.
    fn on_fragment(&mut self, fragment: StreamFragment) -> bool {
        let text = fragment.content_str();
        trace!(session = %self.session.id(), len = text.len(), "fragment");

        for delta in &fragment.tool_calls {
            self.tool_calls.on_delta(delta);
        }
        if let Some(usage) = fragment.usage.clone() {
            let r = self.session.set_usage(usage);
            self.record(r);
        }

        if let Some(req) = self.control.pending_cancellation() {
            match req.boundary.evaluate(self.session.buffer(), text) {
                // A request replaced since the snapshot is left for the next fragment.
                Ok(BoundaryDecision::Stop { keep })
                    if self.control.take_cancellation_if(|r| *r == req).is_some() =>
                {
                    if req.boundary != CancelBoundary::Immediate {
                        let retract = req.boundary.retract(self.session.buffer(), text);
                        let r = self
                            .session
                            .append(&text[..keep], fragment.reasoning.as_deref());
                        self.record(r);
                        if retract > 0 {
                            let len = self.session.buffer().len() - retract;
                            let r = self.session.truncate(len);
                            self.record(r);
                        }
                    }
                    self.finish_cancelled(req.reason);
                    return true;
                }
                Ok(_) => {}
                Err(e) => {
                    trace!(session = %self.session.id(), error = %e, "boundary undecided");
                }
            }
        }

        let r = self.session.append(text, fragment.reasoning.as_deref());
        self.record(r);
        self.publish();

        if fragment.is_terminal() {
            self.finish_source_end();
            return true;
        }
        false
    }

    fn take_immediate(&self) -> Option<CancellationRequest> {
        self.control
            .take_cancellation_if(|r| r.boundary == CancelBoundary::Immediate)
    }

    async fn pause_gate(&mut self) {
        if !self.control.is_paused() || self.control.is_cancel_requested() {
            return;
        }
        let r = self.session.set_paused(true);
        self.record(r);
        self.publish();
        debug!(session = %self.session.id(), "paused");

        while self.control.is_paused() && !self.control.is_cancel_requested() {
            tokio::time::sleep(self.config.pause_poll_interval).await;
        }

        let r = self.session.set_paused(false);
        self.record(r);
        self.publish();
        debug!(session = %self.session.id(), "resumed");
    }

    /// The source is done. A cancellation still waiting for its boundary is
    /// honoured at the last point in the text that satisfies it.
    fn finish_source_end(&mut self) {
        match self.control.take_cancellation() {
            Some(req) => {
                let cut = req.boundary.last_cut(self.session.buffer());
                debug!(
                    session = %self.session.id(),
                    boundary = %req.boundary,
                    dropped = self.session.buffer().len() - cut,
                    "source ended before boundary; cutting back"
                );
                let r = self.session.truncate(cut);
                self.record(r);
                self.finish_cancelled(req.reason);
            }
            None => self.finish_complete(),
        }
    }

    fn finish_complete(&mut self) {
        let calls = std::mem::take(&mut self.tool_calls).finalize();
        if !calls.is_empty() {
            let r = self.session.set_tool_calls(calls);
            self.record(r);
        }
        let r = self.session.complete();
        self.record(r);
        self.publish();
        info!(session = %self.session.id(), chunks = self.session.chunk_count(), "stream complete");
    }

    fn finish_cancelled(&mut self, reason: String) {
        info!(session = %self.session.id(), reason = %reason, "stream cancelled");
        let r = self.session.cancel(reason);
        self.record(r);
        self.publish();
    }

    fn finish_failed(&mut self, err: crate::Error) {
        warn!(session = %self.session.id(), error = %err, "stream source failed");
        let r = self.session.fail(StreamError::source_error(err));
        self.record(r);
        self.publish();
    }

    fn publish(&self) {
        let snapshot = self.session.snapshot();
        if let Some(observer) = &self.observer {
            observer(&snapshot);
        }
        self.updates.send_replace(snapshot);
    }

    fn record(&self, result: Result<(), StreamError>) {
        if let Err(e) = result {
            warn!(session = %self.session.id(), error = %e, "session mutation rejected");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_interval_is_clamped() {
        let c = ConsumerConfig::new().with_pause_poll_interval(Duration::ZERO);
        assert_eq!(c.pause_poll_interval, MIN_POLL_INTERVAL);
        let c = ConsumerConfig::new().with_pause_poll_interval(Duration::from_secs(30));
        assert_eq!(c.pause_poll_interval, MAX_POLL_INTERVAL);
    }
}
