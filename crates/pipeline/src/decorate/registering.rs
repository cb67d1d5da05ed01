use std::sync::Arc;

use async_trait::async_trait;
use dispatch::{BoxError, DispatchContext, Handle};

use crate::registrar::EventRegistrar;

/// Arms the scoped event registrar before delegating and fires exactly one
/// of post/rollback afterwards.
///
/// A delegate that returns normally gets the post notifications; a
/// failing delegate gets the rollback notifications and its error is
/// rethrown unchanged.
pub struct Registering<R, T> {
    registrar: EventRegistrar,
    inner: Arc<dyn Handle<R, T>>,
}

impl<R, T> Registering<R, T> {
    pub fn new(registrar: EventRegistrar, inner: Arc<dyn Handle<R, T>>) -> Self {
        Self { registrar, inner }
    }
}

#[async_trait]
impl<R, T> Handle<R, T> for Registering<R, T>
where
    R: Send + 'static,
    T: Send + 'static,
{
    async fn handle(
        &self,
        request: R,
        ctx: &DispatchContext,
    ) -> std::result::Result<T, BoxError> {
        self.registrar
            .arm()
            .map_err(|error| Box::new(error) as BoxError)?;

        match self.inner.handle(request, ctx).await {
            Ok(value) => {
                if let Err(error) = self.registrar.fire_success() {
                    tracing::warn!(%error, "post notifications could not fire");
                }
                Ok(value)
            }
            Err(fault) => {
                if let Err(error) = self.registrar.fire_failure() {
                    tracing::warn!(%error, "rollback notifications could not fire");
                }
                Err(fault)
            }
        }
    }
}
