//! Transaction scopes.

use std::time::Duration;

use thiserror::Error;

/// Options attached to a transactional request type.
#[derive(Debug, Clone, Default)]
pub struct TransactionOptions {
    /// Upper bound on how long the scoped work may run. `None` means no
    /// limit; the dispatcher itself never enforces timeouts.
    pub timeout: Option<Duration>,
}

impl TransactionOptions {
    /// Options with no timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Options bounding the scoped work to `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }
}

/// The scoped work outlived the transaction's timeout.
#[derive(Debug, Error)]
#[error("transaction timed out after {0:?}")]
pub struct TransactionTimeout(pub Duration);

/// Guard over an open transaction.
///
/// Dropping the scope without calling [`TransactionScope::commit`] runs the
/// rollback action, discarding everything staged or saved since the scope
/// opened.
pub struct TransactionScope {
    on_commit: Option<Box<dyn FnOnce() + Send>>,
    on_rollback: Option<Box<dyn FnOnce() + Send>>,
}

impl TransactionScope {
    /// Builds a scope from implementation-supplied commit and rollback
    /// actions. Exactly one of the two will run.
    pub fn new(
        on_commit: Box<dyn FnOnce() + Send>,
        on_rollback: Box<dyn FnOnce() + Send>,
    ) -> Self {
        Self {
            on_commit: Some(on_commit),
            on_rollback: Some(on_rollback),
        }
    }

    /// Commits the scope, keeping everything saved inside it.
    pub fn commit(mut self) {
        self.on_rollback = None;
        if let Some(commit) = self.on_commit.take() {
            commit();
        }
    }
}

impl Drop for TransactionScope {
    fn drop(&mut self) {
        self.on_commit = None;
        if let Some(rollback) = self.on_rollback.take() {
            tracing::debug!("transaction scope dropped without commit, rolling back");
            rollback();
        }
    }
}

impl std::fmt::Debug for TransactionScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionScope")
            .field("committed", &self.on_commit.is_none())
            .finish()
    }
}
