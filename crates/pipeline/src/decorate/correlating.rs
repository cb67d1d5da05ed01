use std::sync::Arc;

use async_trait::async_trait;
use dispatch::{BoxError, DispatchContext, Handle};
use tracing::Instrument;

/// Enters the ambient correlation scope around the delegate.
///
/// The outermost entry assigns a fresh correlation id; nested dispatches
/// reuse it. The id is recorded on a tracing span covering the delegate.
pub struct Correlating<R, T> {
    inner: Arc<dyn Handle<R, T>>,
}

impl<R, T> Correlating<R, T> {
    pub fn new(inner: Arc<dyn Handle<R, T>>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<R, T> Handle<R, T> for Correlating<R, T>
where
    R: Send + 'static,
    T: Send + 'static,
{
    async fn handle(
        &self,
        request: R,
        ctx: &DispatchContext,
    ) -> std::result::Result<T, BoxError> {
        let guard = ctx.correlation().enter();
        let span = tracing::info_span!("correlated", correlation_id = %guard.id());
        let outcome = self.inner.handle(request, ctx).instrument(span).await;
        drop(guard);
        outcome
    }
}
