use crate::stream::{SessionSnapshot, StreamControl, StreamSession};
use crate::{Error, ErrorContext, Result};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Handle to a streaming session running on a background task.
///
/// Dropping the handle does not stop the session; use
/// [`control`](Self::control) to cancel it.
pub struct SessionHandle {
    id: String,
    control: StreamControl,
    updates: watch::Receiver<SessionSnapshot>,
    task: JoinHandle<StreamSession>,
}

impl SessionHandle {
    pub(crate) fn new(
        id: String,
        control: StreamControl,
        updates: watch::Receiver<SessionSnapshot>,
        task: JoinHandle<StreamSession>,
    ) -> Self {
        Self {
            id,
            control,
            updates,
            task,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn control(&self) -> &StreamControl {
        &self.control
    }

    /// Latest-value view of the session.
    pub fn updates(&self) -> watch::Receiver<SessionSnapshot> {
        self.updates.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.updates.borrow().clone()
    }

    /// Wait for the session to reach a terminal state.
    pub async fn wait(self) -> Result<StreamSession> {
        self.task.await.map_err(|e| {
            Error::runtime_with_context(
                format!("session task failed: {}", e),
                ErrorContext::new()
                    .with_source("session_handle")
                    .with_details(self.id.clone()),
            )
        })
    }
}
