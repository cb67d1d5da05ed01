//! Per-dispatch ambient state: cooperative cancellation and the
//! correlation scope shared across nested dispatches.

use std::sync::Arc;

use common::CorrelationId;
use parking_lot::Mutex;
use tokio::sync::watch;

use crate::error::{DispatchError, Result};

/// Cooperative cancellation flag threaded through every dispatch call.
///
/// Handlers are expected to observe it at I/O boundaries; the dispatcher
/// never forcibly interrupts running handlers. Clones share one state.
#[derive(Clone)]
pub struct CancellationToken {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl CancellationToken {
    /// A live, uncancelled token.
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    /// Flags the token as cancelled and wakes every waiter.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    /// Whether the token has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Suspends until the token is cancelled.
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        // The sender lives inside every clone of the token, so the channel
        // cannot close while we wait.
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[derive(Default)]
struct ScopeState {
    current: Option<CorrelationId>,
    depth: u32,
}

/// The ambient correlation scope for one logical request.
///
/// The outermost entry assigns a fresh [`CorrelationId`]; nested entries
/// reuse it. When the last guard drops the scope resets, so it is reusable
/// by the next request in the same logical scope. Not meant to be shared
/// across concurrently executing requests.
#[derive(Clone, Default)]
pub struct CorrelationScope {
    inner: Arc<Mutex<ScopeState>>,
}

impl CorrelationScope {
    /// An idle scope with no current correlation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enters the scope, returning a guard that exits on drop.
    pub fn enter(&self) -> CorrelationGuard {
        let mut state = self.inner.lock();
        state.depth += 1;
        let id = *state.current.get_or_insert_with(CorrelationId::new);
        CorrelationGuard {
            scope: self.clone(),
            id,
        }
    }

    /// The current correlation id, if any dispatch is in flight.
    pub fn current(&self) -> Option<CorrelationId> {
        self.inner.lock().current
    }

    fn exit(&self) {
        let mut state = self.inner.lock();
        state.depth = state.depth.saturating_sub(1);
        if state.depth == 0 {
            state.current = None;
        }
    }
}

/// Guard over one entry into a [`CorrelationScope`].
pub struct CorrelationGuard {
    scope: CorrelationScope,
    id: CorrelationId,
}

impl CorrelationGuard {
    /// The correlation id active for this entry.
    pub fn id(&self) -> CorrelationId {
        self.id
    }
}

impl Drop for CorrelationGuard {
    fn drop(&mut self) {
        self.scope.exit();
    }
}

/// Ambient state carried through one dispatch call tree.
#[derive(Clone, Default, Debug)]
pub struct DispatchContext {
    cancellation: CancellationToken,
    correlation: CorrelationScope,
}

impl std::fmt::Debug for CorrelationScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorrelationScope")
            .field("current", &self.current())
            .finish()
    }
}

impl DispatchContext {
    /// A fresh context with its own token and correlation scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context observing an externally owned cancellation token.
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self {
            cancellation: token,
            correlation: CorrelationScope::new(),
        }
    }

    /// The cancellation token for this call tree.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// The correlation scope for this call tree.
    pub fn correlation(&self) -> &CorrelationScope {
        &self.correlation
    }

    /// Fails with [`DispatchError::Cancelled`] if the token is cancelled.
    pub fn ensure_live(&self) -> Result<()> {
        if self.cancellation.is_cancelled() {
            Err(DispatchError::Cancelled)
        } else {
            Ok(())
        }
    }
}
