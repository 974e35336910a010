//! A write-once handle for the compressed output of a batch, shared between the job producing it
//! and whoever is waiting to send it.
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;
use tokio::sync::Notify;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PromiseError {
    #[error("Promise has already been resolved")]
    AlreadyResolved,

    #[error("The job producing this batch failed")]
    Failed,

    #[error("Promise was cancelled")]
    Cancelled,

    #[error("Timed out after {0:?} waiting for the batch")]
    TimedOut(Duration),
}

type Callback = Box<dyn FnOnce(Bytes) + Send>;

enum State {
    Pending(Vec<Callback>),
    Resolved(Bytes),
    Failed,
    Cancelled,
}

struct Inner {
    state: Mutex<State>,
    notify: Notify,
}

#[derive(Clone)]
pub struct CompressBatchPromise {
    inner: Arc<Inner>,
}

impl Default for CompressBatchPromise {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CompressBatchPromise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &*self.lock() {
            State::Pending(_) => "pending",
            State::Resolved(_) => "resolved",
            State::Failed => "failed",
            State::Cancelled => "cancelled",
        };
        f.debug_struct("CompressBatchPromise")
            .field("state", &state)
            .finish()
    }
}

impl CompressBatchPromise {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::Pending(Vec::new())),
                notify: Notify::new(),
            }),
        }
    }

    // Callbacks never run under the lock, so a panic while holding it leaves the state intact.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores the result and runs every registered callback with it.
    ///
    /// Resolving a cancelled promise is silently ignored, since nobody wants the result anymore.
    pub fn resolve(&self, result: Bytes) -> Result<(), PromiseError> {
        let callbacks = {
            let mut state = self.lock();
            match &mut *state {
                State::Pending(callbacks) => {
                    let callbacks = std::mem::take(callbacks);
                    *state = State::Resolved(result.clone());
                    callbacks
                }
                State::Resolved(_) => return Err(PromiseError::AlreadyResolved),
                State::Failed => return Err(PromiseError::Failed),
                State::Cancelled => return Ok(()),
            }
        };

        self.inner.notify.notify_waiters();
        for callback in callbacks {
            callback(result.clone());
        }
        Ok(())
    }

    /// Marks the promise as failed. Returns `false` if it was no longer pending.
    pub fn fail(&self) -> bool {
        self.settle(State::Failed)
    }

    /// Signals that the result is no longer wanted. Returns `false` if it was no longer pending.
    pub fn cancel(&self) -> bool {
        self.settle(State::Cancelled)
    }

    fn settle(&self, new_state: State) -> bool {
        {
            let mut state = self.lock();
            if !matches!(*state, State::Pending(_)) {
                return false;
            }
            *state = new_state;
        }
        self.inner.notify.notify_waiters();
        true
    }

    /// Runs `callback` once the promise resolves, or right away if it already has.
    /// Callbacks registered on a failed or cancelled promise are dropped.
    pub fn on_resolve<F>(&self, callback: F)
    where
        F: FnOnce(Bytes) + Send + 'static,
    {
        let resolved = {
            let mut state = self.lock();
            match &mut *state {
                State::Pending(callbacks) => {
                    callbacks.push(Box::new(callback));
                    return;
                }
                State::Resolved(result) => result.clone(),
                State::Failed | State::Cancelled => return,
            }
        };
        callback(resolved);
    }

    pub fn result(&self) -> Option<Bytes> {
        match &*self.lock() {
            State::Resolved(result) => Some(result.clone()),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(*self.lock(), State::Resolved(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(*self.lock(), State::Failed)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(*self.lock(), State::Cancelled)
    }

    fn settled(&self) -> Option<Result<Bytes, PromiseError>> {
        match &*self.lock() {
            State::Pending(_) => None,
            State::Resolved(result) => Some(Ok(result.clone())),
            State::Failed => Some(Err(PromiseError::Failed)),
            State::Cancelled => Some(Err(PromiseError::Cancelled)),
        }
    }

    /// Waits until the promise leaves the pending state.
    pub async fn wait(&self) -> Result<Bytes, PromiseError> {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            // Register before checking the state so a concurrent resolve cannot be missed.
            notified.as_mut().enable();

            if let Some(settled) = self.settled() {
                return settled;
            }
            notified.await;
        }
    }

    pub async fn wait_timeout(&self, timeout: Duration) -> Result<Bytes, PromiseError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| PromiseError::TimedOut(timeout))?
    }
}
