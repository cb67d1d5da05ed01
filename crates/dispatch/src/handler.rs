//! Handler contracts.
//!
//! Commands and queries share one handler seam, [`Handle`], so the
//! decorators in the pipeline crate are written once and wrap either kind.
//! Events have their own fan-out contract, [`EventHandler`].

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::DispatchContext;
use crate::error::BoxError;
use crate::message::{Event, Query};

/// Handles one request of type `R`, producing a `T`.
///
/// Handlers report failures as [`BoxError`]; the dispatcher classifies
/// them into the closed taxonomy exactly once.
#[async_trait]
pub trait Handle<R, T>: Send + Sync
where
    R: Send + 'static,
    T: Send + 'static,
{
    /// Processes the request.
    async fn handle(&self, request: R, ctx: &DispatchContext)
    -> std::result::Result<T, BoxError>;
}

/// The handler shape for a command: request in, nothing out.
pub type CommandHandler<C> = dyn Handle<C, ()>;

/// The handler shape for a query.
pub type QueryHandler<Q> = dyn Handle<Q, <Q as Query>::Output>;

/// Handles one event. Many handlers may observe the same event.
#[async_trait]
pub trait EventHandler<E: Event>: Send + Sync {
    /// Reacts to the event.
    async fn handle(&self, event: &E, ctx: &DispatchContext)
    -> std::result::Result<(), BoxError>;
}

struct FnHandler<F, R, T> {
    run: F,
    _marker: PhantomData<fn(R) -> T>,
}

#[async_trait]
impl<F, Fut, R, T> Handle<R, T> for FnHandler<F, R, T>
where
    R: Send + 'static,
    T: Send + 'static,
    F: Fn(R) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<T, BoxError>> + Send + 'static,
{
    async fn handle(
        &self,
        request: R,
        _ctx: &DispatchContext,
    ) -> std::result::Result<T, BoxError> {
        (self.run)(request).await
    }
}

/// Adapts an async closure into a handler.
pub fn handler_fn<R, T, F, Fut>(run: F) -> Arc<dyn Handle<R, T>>
where
    R: Send + 'static,
    T: Send + 'static,
    F: Fn(R) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<T, BoxError>> + Send + 'static,
{
    Arc::new(FnHandler {
        run,
        _marker: PhantomData,
    })
}
