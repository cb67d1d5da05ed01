use std::sync::Arc;

use async_trait::async_trait;
use dispatch::{BoxError, DispatchContext, Handle};

use crate::validator::CompositeValidator;

/// Runs the composite validator against the request before delegating.
///
/// A validation failure prevents the delegate from running, so neither
/// persistence nor event firing can happen for a rejected request.
pub struct Validating<R, T> {
    validator: CompositeValidator<R>,
    inner: Arc<dyn Handle<R, T>>,
}

impl<R, T> Validating<R, T> {
    pub fn new(validator: CompositeValidator<R>, inner: Arc<dyn Handle<R, T>>) -> Self {
        Self { validator, inner }
    }
}

#[async_trait]
impl<R, T> Handle<R, T> for Validating<R, T>
where
    R: Send + 'static,
    T: Send + 'static,
{
    async fn handle(
        &self,
        request: R,
        ctx: &DispatchContext,
    ) -> std::result::Result<T, BoxError> {
        self.validator
            .validate(&request)
            .map_err(|error| Box::new(error) as BoxError)?;
        self.inner.handle(request, ctx).await
    }
}
