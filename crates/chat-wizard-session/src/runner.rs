//! Session runner that serializes submissions to a controller.

use std::sync::Arc;

use chat_wizard_core::{
    DialogueController, Selection, SessionId, Step, Surface, Transport,
};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};

/// Runner error.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RunnerError {
    #[error("A submission is already in flight")]
    Busy,
    #[error("Session runner has stopped")]
    Closed,
    #[error("Session task failed: {0}")]
    Task(String),
}

/// Snapshot of the runner, published after every change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunnerState {
    /// A submission is being processed.
    pub busy: bool,
    /// Wizard step, if the wizard is active.
    pub step: Option<Step>,
}

/// Frees the submission slot when the task ends, including by panic, so
/// waiters on [`SessionRunner::idle`] are released.
struct ReleaseOnExit(Arc<watch::Sender<RunnerState>>);

impl Drop for ReleaseOnExit {
    fn drop(&mut self) {
        self.0.send_if_modified(|state| std::mem::replace(&mut state.busy, false));
    }
}

/// Runs a [`DialogueController`] on its own task.
///
/// At most one submission is in flight: a second one is refused with
/// [`RunnerError::Busy`] instead of racing the first, so responses are
/// always folded in submission order.
pub struct SessionRunner<T, S> {
    session_id: SessionId,
    tx: mpsc::Sender<String>,
    state: Arc<watch::Sender<RunnerState>>,
    task: JoinHandle<DialogueController<T, S>>,
}

impl<T, S> SessionRunner<T, S>
where
    T: Transport + 'static,
    S: Surface + 'static,
{
    /// Move `controller` onto a new task.
    #[must_use]
    pub fn spawn(controller: DialogueController<T, S>) -> Self {
        let session_id = controller.session_id();
        let (tx, mut rx) = mpsc::channel::<String>(1);
        let state = Arc::new(watch::Sender::new(RunnerState {
            busy: false,
            step: controller.wizard().current_step(),
        }));

        let task_state = Arc::clone(&state);
        let task = tokio::spawn(async move {
            let _release = ReleaseOnExit(Arc::clone(&task_state));
            let mut controller = controller;
            while let Some(text) = rx.recv().await {
                let outcome = controller.submit(&text).await;
                tracing::debug!(session = %session_id, ?outcome, "submission handled");
                let step = controller.wizard().current_step();
                task_state.send_replace(RunnerState { busy: false, step });
            }
            tracing::debug!(session = %session_id, "session runner stopped");
            controller
        });

        Self {
            session_id,
            tx,
            state,
            task,
        }
    }

    /// Session identifier of the controller.
    #[must_use]
    pub const fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Current runner state.
    #[must_use]
    pub fn state(&self) -> RunnerState {
        *self.state.borrow()
    }

    /// Whether a submission is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.state().busy
    }

    /// Receiver that observes every state change.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<RunnerState> {
        self.state.subscribe()
    }

    /// Queue `text` for the controller.
    ///
    /// Blank text is accepted and dropped without occupying the slot.
    ///
    /// # Errors
    /// Returns `Busy` while another submission is in flight, `Closed` once
    /// the task has stopped.
    pub fn try_submit(&self, text: impl Into<String>) -> Result<(), RunnerError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Ok(());
        }

        let claimed = self.state.send_if_modified(|state| {
            if state.busy {
                false
            } else {
                state.busy = true;
                true
            }
        });
        if !claimed {
            return Err(RunnerError::Busy);
        }

        self.tx.try_send(text).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => RunnerError::Busy,
            mpsc::error::TrySendError::Closed(_) => {
                self.state.send_modify(|state| state.busy = false);
                RunnerError::Closed
            }
        })
    }

    /// Relay a picked option as a submission.
    ///
    /// # Errors
    /// Same as [`Self::try_submit`].
    pub fn select(&self, selection: Selection) -> Result<(), RunnerError> {
        self.try_submit(selection.into_submission())
    }

    /// Wait until no submission is in flight.
    pub async fn idle(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|state| !state.busy).await;
    }

    /// Stop accepting submissions and return the controller once the
    /// in-flight submission (if any) is done.
    ///
    /// # Errors
    /// Returns error if the task panicked.
    pub async fn shutdown(self) -> Result<DialogueController<T, S>, RunnerError> {
        drop(self.tx);
        self.task.await.map_err(|e| RunnerError::Task(e.to_string()))
    }
}
