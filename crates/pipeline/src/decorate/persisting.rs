use std::sync::Arc;

use async_trait::async_trait;
use context::DataContext;
use dispatch::{BoxError, DispatchContext, DispatchError, Handle};

/// Delegates, then persists all pending changes in one `save_changes`
/// call.
///
/// A storage failure surfaces as [`DispatchError::Persistence`] with the
/// storage error as its source, keeping conflict/not-found/connectivity
/// distinctions intact. Business logic the delegate already ran is not
/// undone here; that is the transaction decorator's concern.
pub struct Persisting<R, T> {
    data_context: Arc<dyn DataContext>,
    inner: Arc<dyn Handle<R, T>>,
}

impl<R, T> Persisting<R, T> {
    pub fn new(data_context: Arc<dyn DataContext>, inner: Arc<dyn Handle<R, T>>) -> Self {
        Self {
            data_context,
            inner,
        }
    }
}

#[async_trait]
impl<R, T> Handle<R, T> for Persisting<R, T>
where
    R: Send + 'static,
    T: Send + 'static,
{
    async fn handle(
        &self,
        request: R,
        ctx: &DispatchContext,
    ) -> std::result::Result<T, BoxError> {
        let value = self.inner.handle(request, ctx).await?;
        match self.data_context.save_changes().await {
            Ok(applied) => {
                tracing::debug!(applied, "pending changes saved");
                Ok(value)
            }
            Err(error) => Err(Box::new(DispatchError::Persistence {
                source: Box::new(error),
            }) as BoxError),
        }
    }
}
