//! Per-scope arm/fire-once notification slot.
//!
//! State transitions:
//! ```text
//! Idle ──arm──► Armed ──fire_success (post fires)───► Idle
//!                 └────fire_failure (rollback fires)─► Idle
//! ```
//!
//! Exactly one of post/rollback fires per armed cycle, never both, and the
//! terminal transitions always reset back to `Idle` so the registrar is
//! reusable by the next request in the same logical scope. One instance
//! per scope; not meant to be shared across concurrently executing
//! requests.

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

/// A queued notification callback.
pub type Notification = Box<dyn FnOnce() + Send>;

/// Errors from invalid registrar transitions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrarError {
    /// `arm` was called while already armed.
    #[error("event registrar is already armed")]
    AlreadyArmed,

    /// A notification was queued or fired outside an armed cycle.
    #[error("event registrar is not armed")]
    NotArmed,
}

enum State {
    Idle,
    Armed {
        post: Vec<Notification>,
        rollback: Vec<Notification>,
    },
}

/// The scoped post/rollback notification slot the event-register decorator
/// drives.
#[derive(Clone)]
pub struct EventRegistrar {
    inner: Arc<Mutex<State>>,
}

impl Default for EventRegistrar {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(State::Idle)),
        }
    }
}

impl EventRegistrar {
    /// An idle registrar.
    pub fn new() -> Self {
        Self::default()
    }

    /// True while an armed cycle is in progress.
    pub fn is_armed(&self) -> bool {
        matches!(&*self.inner.lock(), State::Armed { .. })
    }

    /// Starts an armed cycle. Valid only from `Idle`.
    pub fn arm(&self) -> Result<(), RegistrarError> {
        let mut state = self.inner.lock();
        match &*state {
            State::Idle => {
                *state = State::Armed {
                    post: Vec::new(),
                    rollback: Vec::new(),
                };
                Ok(())
            }
            State::Armed { .. } => Err(RegistrarError::AlreadyArmed),
        }
    }

    /// Queues a callback to fire when the cycle completes successfully.
    pub fn on_post(&self, notify: impl FnOnce() + Send + 'static) -> Result<(), RegistrarError> {
        match &mut *self.inner.lock() {
            State::Armed { post, .. } => {
                post.push(Box::new(notify));
                Ok(())
            }
            State::Idle => Err(RegistrarError::NotArmed),
        }
    }

    /// Queues a callback to fire when the cycle rolls back.
    pub fn on_rollback(
        &self,
        notify: impl FnOnce() + Send + 'static,
    ) -> Result<(), RegistrarError> {
        match &mut *self.inner.lock() {
            State::Armed { rollback, .. } => {
                rollback.push(Box::new(notify));
                Ok(())
            }
            State::Idle => Err(RegistrarError::NotArmed),
        }
    }

    /// Fires the post notifications and resets to `Idle`. Returns how many
    /// fired.
    pub fn fire_success(&self) -> Result<usize, RegistrarError> {
        let notifications = self.take(|post, _rollback| post)?;
        let count = notifications.len();
        for notify in notifications {
            notify();
        }
        Ok(count)
    }

    /// Fires the rollback notifications and resets to `Idle`. Returns how
    /// many fired.
    pub fn fire_failure(&self) -> Result<usize, RegistrarError> {
        let notifications = self.take(|_post, rollback| rollback)?;
        let count = notifications.len();
        for notify in notifications {
            notify();
        }
        Ok(count)
    }

    /// Resets to `Idle`, selecting which queue survives to fire. Callbacks
    /// run outside the lock.
    fn take(
        &self,
        select: impl FnOnce(Vec<Notification>, Vec<Notification>) -> Vec<Notification>,
    ) -> Result<Vec<Notification>, RegistrarError> {
        let mut state = self.inner.lock();
        match std::mem::replace(&mut *state, State::Idle) {
            State::Armed { post, rollback } => Ok(select(post, rollback)),
            State::Idle => Err(RegistrarError::NotArmed),
        }
    }
}
