//! Marker traits for the three message kinds.

use std::any::{Any, TypeId};

/// An intent to mutate state. Consumed once by exactly one handler.
pub trait Command: Send + 'static {}

/// A read request parameterized by its result type. Consumed once by
/// exactly one handler.
pub trait Query: Send + 'static {
    /// The value this query produces.
    type Output: Send + 'static;
}

/// Something that happened. May have zero or many handlers.
pub trait Event: Send + Sync + 'static {}

/// Object-safe view of a query whose concrete type is only known at
/// runtime.
///
/// A call site may hold a `Box<dyn AnyQuery<R>>` knowing only the result
/// type; the dispatcher resolves the handler from the boxed query's
/// runtime type, not the static parameter.
pub trait AnyQuery<R>: Send {
    /// The `TypeId` of the concrete query type.
    fn query_type(&self) -> TypeId;

    /// The concrete query type's name, for diagnostics.
    fn query_type_name(&self) -> &'static str;

    /// Erases the query for the registry's invoker.
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
}

impl<R, Q> AnyQuery<R> for Q
where
    Q: Query<Output = R>,
{
    fn query_type(&self) -> TypeId {
        TypeId::of::<Q>()
    }

    fn query_type_name(&self) -> &'static str {
        std::any::type_name::<Q>()
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}
