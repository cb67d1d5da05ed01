//! The typed handler registry.
//!
//! Handlers are registered against concrete message types at startup and
//! stored behind type-erased invoker closures keyed by `TypeId`, so the
//! dispatcher can resolve a handler from a request's runtime type without
//! knowing any handler types itself.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::DispatchContext;
use crate::dispatcher::Dispatcher;
use crate::error::{BoxError, DispatchError};
use crate::handler::{EventHandler, Handle};
use crate::message::{Command, Event, Query};

pub(crate) type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
pub(crate) type AnyRequest = Box<dyn Any + Send>;
pub(crate) type AnyResponse = Box<dyn Any + Send>;
pub(crate) type SharedEvent = Arc<dyn Any + Send + Sync>;

pub(crate) type RequestInvoker = Box<
    dyn Fn(AnyRequest, DispatchContext) -> BoxFuture<std::result::Result<AnyResponse, BoxError>>
        + Send
        + Sync,
>;
pub(crate) type EventInvoker = Box<
    dyn Fn(SharedEvent, DispatchContext) -> BoxFuture<std::result::Result<(), BoxError>>
        + Send
        + Sync,
>;

pub(crate) struct RequestEntry {
    pub(crate) type_name: &'static str,
    pub(crate) invoker: RequestInvoker,
}

pub(crate) struct EventEntry {
    pub(crate) invoker: EventInvoker,
}

/// Builds a [`Dispatcher`] from explicit handler registrations.
///
/// Exactly one handler per command or query type (re-registering replaces,
/// matching how container decoration would rebind a registration); zero or
/// more handlers per event type, preserved in registration order.
#[derive(Default)]
pub struct DispatcherBuilder {
    pub(crate) commands: HashMap<TypeId, RequestEntry>,
    pub(crate) queries: HashMap<TypeId, RequestEntry>,
    pub(crate) events: HashMap<TypeId, Vec<EventEntry>>,
}

impl DispatcherBuilder {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the handler for command type `C`.
    pub fn register_command<C: Command>(mut self, handler: Arc<dyn Handle<C, ()>>) -> Self {
        let invoker: RequestInvoker = Box::new(move |request, ctx| {
            let handler = handler.clone();
            Box::pin(async move {
                let command = request.downcast::<C>().map_err(|_| {
                    Box::new(DispatchError::InvalidArgument("command payload type"))
                        as BoxError
                })?;
                handler.handle(*command, &ctx).await?;
                Ok(Box::new(()) as AnyResponse)
            })
        });
        self.commands.insert(
            TypeId::of::<C>(),
            RequestEntry {
                type_name: std::any::type_name::<C>(),
                invoker,
            },
        );
        self
    }

    /// Registers the handler for query type `Q`.
    pub fn register_query<Q: Query>(mut self, handler: Arc<dyn Handle<Q, Q::Output>>) -> Self {
        let invoker: RequestInvoker = Box::new(move |request, ctx| {
            let handler = handler.clone();
            Box::pin(async move {
                let query = request.downcast::<Q>().map_err(|_| {
                    Box::new(DispatchError::InvalidArgument("query payload type")) as BoxError
                })?;
                let output = handler.handle(*query, &ctx).await?;
                Ok(Box::new(output) as AnyResponse)
            })
        });
        self.queries.insert(
            TypeId::of::<Q>(),
            RequestEntry {
                type_name: std::any::type_name::<Q>(),
                invoker,
            },
        );
        self
    }

    /// Adds a handler for event type `E` to the fan-out list.
    pub fn register_event<E: Event>(mut self, handler: Arc<dyn EventHandler<E>>) -> Self {
        let invoker: EventInvoker = Box::new(move |event, ctx| {
            let handler = handler.clone();
            Box::pin(async move {
                match event.downcast::<E>() {
                    Ok(event) => handler.handle(&event, &ctx).await,
                    Err(_) => Err(Box::new(DispatchError::InvalidArgument("event payload type"))
                        as BoxError),
                }
            })
        });
        self.events
            .entry(TypeId::of::<E>())
            .or_default()
            .push(EventEntry { invoker });
        self
    }

    /// Finalizes the registry.
    pub fn build(self) -> Dispatcher {
        Dispatcher::from_builder(self)
    }
}
