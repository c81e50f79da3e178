//! One-shot, cancelable delayed callbacks on the tokio runtime.
//!
//! The machine keeps at most one [`TimerHandle`] alive; dropping or
//! cancelling it aborts the pending task. Cancellation is best-effort: a
//! callback that is already running completes, which is why timed
//! transitions go through the same source-state guard as any other request.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::state_machine::MachineError;

/// Schedules delayed callbacks on a captured runtime handle.
#[derive(Debug, Clone)]
pub struct TimerService {
    runtime: Handle,
}

impl TimerService {
    #[must_use]
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Bind to the runtime the caller is running on.
    ///
    /// # Errors
    ///
    /// Returns [`MachineError::NoRuntime`] outside a tokio runtime.
    pub fn from_current() -> Result<Self, MachineError> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|_| MachineError::NoRuntime)
    }

    /// Run `callback` once `after` has elapsed, unless cancelled first.
    pub fn schedule<F>(&self, after: Duration, callback: F) -> TimerHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(after).await;
            callback();
        });
        TimerHandle { task }
    }
}

/// A pending callback. Aborted when cancelled or dropped.
#[derive(Debug)]
pub struct TimerHandle {
    task: JoinHandle<()>,
}

impl TimerHandle {
    pub fn cancel(self) {
        drop(self);
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
