//! Caller-side handle for pausing and cancelling a running consumer.

use super::boundary::CancelBoundary;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;

/// One-shot cancellation request, consumed at the first fragment satisfying `boundary`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancellationRequest {
    pub boundary: CancelBoundary,
    pub reason: String,
}

impl CancellationRequest {
    pub fn new(boundary: CancelBoundary, reason: impl Into<String>) -> Self {
        Self {
            boundary,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Default)]
struct PendingSlot {
    request: Option<CancellationRequest>,
    // Fired for Immediate requests so a consumer blocked on the source wakes up.
    // Replaced whenever the request is taken, so a reused handle starts clean.
    wakeup: CancellationToken,
}

impl PendingSlot {
    fn take(&mut self) -> Option<CancellationRequest> {
        if self.wakeup.is_cancelled() {
            self.wakeup = CancellationToken::new();
        }
        self.request.take()
    }
}

#[derive(Debug, Default)]
struct ControlState {
    paused: AtomicBool,
    pending: Mutex<PendingSlot>,
}

/// Cloneable control handle shared between the caller and the consumer task.
#[derive(Debug, Clone, Default)]
pub struct StreamControl {
    inner: Arc<ControlState>,
}

impl StreamControl {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, PendingSlot> {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Stop consuming after the current fragment until [`resume`](Self::resume).
    pub fn pause(&self) {
        self.inner.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.inner.paused.store(false, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.inner.paused.load(Ordering::SeqCst)
    }

    /// Request cancellation at the next point satisfying `boundary`.
    ///
    /// Replaces any request still pending. A pending Immediate request cannot
    /// be downgraded to a later boundary.
    pub fn cancel(&self, boundary: CancelBoundary, reason: impl Into<String>) {
        let mut slot = self.slot();
        let immediate_pending = slot
            .request
            .as_ref()
            .map_or(false, |r| r.boundary == CancelBoundary::Immediate);
        if boundary != CancelBoundary::Immediate && immediate_pending {
            return;
        }
        slot.request = Some(CancellationRequest::new(boundary, reason));
        if boundary == CancelBoundary::Immediate {
            slot.wakeup.cancel();
        }
    }

    /// Shorthand for an [`CancelBoundary::Immediate`] cancellation.
    pub fn cancel_now(&self, reason: impl Into<String>) {
        self.cancel(CancelBoundary::Immediate, reason);
    }

    pub fn pending_cancellation(&self) -> Option<CancellationRequest> {
        self.slot().request.clone()
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.slot().request.is_some()
    }

    /// Take the pending request, leaving none behind.
    pub(crate) fn take_cancellation(&self) -> Option<CancellationRequest> {
        self.slot().take()
    }

    /// Take the pending request only if `accept` holds for it, checked and
    /// taken under one lock.
    pub(crate) fn take_cancellation_if<F>(&self, accept: F) -> Option<CancellationRequest>
    where
        F: FnOnce(&CancellationRequest) -> bool,
    {
        let mut slot = self.slot();
        match slot.request.as_ref() {
            Some(req) if accept(req) => slot.take(),
            _ => None,
        }
    }

    /// Resolves once an Immediate cancellation has been requested.
    pub(crate) async fn immediate_requested(&self) {
        let wakeup = self.slot().wakeup.clone();
        wakeup.cancelled().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_request_wins() {
        let control = StreamControl::new();
        control.cancel(CancelBoundary::AfterParagraph, "first");
        control.cancel(CancelBoundary::AfterWord, "second");

        let pending = control.pending_cancellation().unwrap();
        assert_eq!(pending.boundary, CancelBoundary::AfterWord);
        assert_eq!(pending.reason, "second");

        assert!(control.take_cancellation().is_some());
        assert!(!control.is_cancel_requested());
    }

    #[test]
    fn test_immediate_is_not_downgraded() {
        let control = StreamControl::new();
        control.cancel_now("stop");
        control.cancel(CancelBoundary::AfterSentence, "later");
        let pending = control.pending_cancellation().unwrap();
        assert_eq!(pending.boundary, CancelBoundary::Immediate);
        assert_eq!(pending.reason, "stop");
    }

    #[test]
    fn test_clones_share_state() {
        let control = StreamControl::new();
        let other = control.clone();
        other.pause();
        assert!(control.is_paused());
        control.resume();
        assert!(!other.is_paused());
    }

    #[tokio::test]
    async fn test_immediate_wakes_waiter() {
        let control = StreamControl::new();
        let waiter = control.clone();
        let task = tokio::spawn(async move { waiter.immediate_requested().await });
        control.cancel_now("stop");
        task.await.unwrap();
    }

    #[test]
    fn test_take_if_leaves_replaced_request() {
        let control = StreamControl::new();
        control.cancel(CancelBoundary::AfterWord, "first");
        let seen = control.pending_cancellation().unwrap();
        control.cancel(CancelBoundary::AfterSentence, "second");

        assert!(control.take_cancellation_if(|r| *r == seen).is_none());
        let pending = control.pending_cancellation().unwrap();
        assert_eq!(pending.reason, "second");

        let taken = control
            .take_cancellation_if(|r| r.boundary == CancelBoundary::AfterSentence)
            .unwrap();
        assert_eq!(taken.reason, "second");
        assert!(!control.is_cancel_requested());
    }

    #[tokio::test]
    async fn test_taken_immediate_does_not_poison_handle() {
        let control = StreamControl::new();
        control.cancel_now("first");
        assert_eq!(control.take_cancellation().unwrap().reason, "first");

        control.cancel(CancelBoundary::AfterWord, "second");
        let pending = control.pending_cancellation().unwrap();
        assert_eq!(pending.boundary, CancelBoundary::AfterWord);
        assert_eq!(pending.reason, "second");

        let waiter = control.clone();
        let wake = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            waiter.immediate_requested(),
        )
        .await;
        assert!(wake.is_err(), "stale Immediate must not wake the next session");
    }
}
