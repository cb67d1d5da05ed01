use std::sync::Arc;

use async_trait::async_trait;
use context::{DataContext, TransactionOptions, TransactionTimeout};
use dispatch::{BoxError, DispatchContext, Handle};

/// Marks a request type as transactional and carries its options.
pub trait Transactional {
    /// Options for the scope opened around the handler.
    fn transaction_options(&self) -> TransactionOptions {
        TransactionOptions::default()
    }
}

/// Opens a transaction scope around the delegate.
///
/// Commits when the delegate returns normally; a failing delegate leaves
/// the scope to roll back on drop. When the request's options carry a
/// timeout, the delegate runs under it and overrunning counts as a
/// failure.
pub struct Transacting<R, T> {
    data_context: Arc<dyn DataContext>,
    inner: Arc<dyn Handle<R, T>>,
}

impl<R, T> Transacting<R, T> {
    pub fn new(data_context: Arc<dyn DataContext>, inner: Arc<dyn Handle<R, T>>) -> Self {
        Self {
            data_context,
            inner,
        }
    }
}

#[async_trait]
impl<R, T> Handle<R, T> for Transacting<R, T>
where
    R: Transactional + Send + 'static,
    T: Send + 'static,
{
    async fn handle(
        &self,
        request: R,
        ctx: &DispatchContext,
    ) -> std::result::Result<T, BoxError> {
        let options = request.transaction_options();
        let scope = self
            .data_context
            .begin(options.clone())
            .await
            .map_err(|error| Box::new(error) as BoxError)?;

        let outcome = match options.timeout {
            Some(limit) => match tokio::time::timeout(limit, self.inner.handle(request, ctx)).await
            {
                Ok(outcome) => outcome,
                Err(_elapsed) => Err(Box::new(TransactionTimeout(limit)) as BoxError),
            },
            None => self.inner.handle(request, ctx).await,
        };

        match outcome {
            Ok(value) => {
                scope.commit();
                Ok(value)
            }
            Err(error) => {
                // Dropping the scope rolls back.
                drop(scope);
                Err(error)
            }
        }
    }
}
