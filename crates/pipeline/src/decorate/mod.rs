//! Decorator composition.
//!
//! Each decorator implements the same [`Handle`] seam as the handler it
//! wraps. [`Pipeline`] composes an ordered list of wraps around an
//! innermost handler at build time; the order is explicit and chosen by
//! the application, never inferred.

mod correlating;
mod persisting;
mod registering;
mod transactional;
mod validating;

pub use correlating::Correlating;
pub use persisting::Persisting;
pub use registering::Registering;
pub use transactional::{Transacting, Transactional};
pub use validating::Validating;

use std::sync::Arc;

use context::DataContext;
use dispatch::Handle;

use crate::registrar::EventRegistrar;
use crate::validator::CompositeValidator;

/// One handler-wrapping step.
pub type Wrap<R, T> =
    Box<dyn FnOnce(Arc<dyn Handle<R, T>>) -> Arc<dyn Handle<R, T>> + Send>;

/// An ordered list of decorator wraps, folded around an inner handler by
/// [`Pipeline::build`]. The first wrap added becomes the outermost
/// decorator.
///
/// # Example
///
/// The canonical command pipeline:
///
/// ```ignore
/// let handler = Pipeline::new()
///     .validated(validator)
///     .correlated()
///     .registering(registrar)
///     .transactional(data_context.clone())
///     .persisting(data_context)
///     .build(inner);
/// ```
pub struct Pipeline<R, T> {
    wraps: Vec<Wrap<R, T>>,
}

impl<R, T> Default for Pipeline<R, T>
where
    R: Send + 'static,
    T: Send + 'static,
{
    fn default() -> Self {
        Self { wraps: Vec::new() }
    }
}

impl<R, T> Pipeline<R, T>
where
    R: Send + 'static,
    T: Send + 'static,
{
    /// An empty pipeline; `build` returns the inner handler unchanged.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an arbitrary wrap as the next-outermost layer.
    pub fn wrap(
        mut self,
        wrap: impl FnOnce(Arc<dyn Handle<R, T>>) -> Arc<dyn Handle<R, T>> + Send + 'static,
    ) -> Self {
        self.wraps.push(Box::new(wrap));
        self
    }

    /// Adds the validation decorator.
    pub fn validated(self, validator: CompositeValidator<R>) -> Self {
        self.wrap(move |inner| Arc::new(Validating::new(validator, inner)))
    }

    /// Adds the correlation decorator.
    pub fn correlated(self) -> Self {
        self.wrap(|inner| Arc::new(Correlating::new(inner)))
    }

    /// Adds the event-register decorator over `registrar`.
    pub fn registering(self, registrar: EventRegistrar) -> Self {
        self.wrap(move |inner| Arc::new(Registering::new(registrar, inner)))
    }

    /// Adds the transaction decorator over `data_context`.
    pub fn transactional(self, data_context: Arc<dyn DataContext>) -> Self
    where
        R: Transactional,
    {
        self.wrap(move |inner| Arc::new(Transacting::new(data_context, inner)))
    }

    /// Adds the persistence decorator over `data_context`.
    pub fn persisting(self, data_context: Arc<dyn DataContext>) -> Self {
        self.wrap(move |inner| Arc::new(Persisting::new(data_context, inner)))
    }

    /// Number of wraps added so far.
    pub fn len(&self) -> usize {
        self.wraps.len()
    }

    /// True when no wraps were added.
    pub fn is_empty(&self) -> bool {
        self.wraps.is_empty()
    }

    /// Folds the wraps around `inner`, innermost-last.
    pub fn build(self, inner: Arc<dyn Handle<R, T>>) -> Arc<dyn Handle<R, T>> {
        self.wraps
            .into_iter()
            .rev()
            .fold(inner, |handler, wrap| wrap(handler))
    }
}
