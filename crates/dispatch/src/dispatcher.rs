//! The dispatcher: resolves the handler for a message's runtime type and
//! invokes it, folding every failure into the closed error taxonomy.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::join_all;

use crate::context::DispatchContext;
use crate::error::{DispatchError, MessageKind, Result};
use crate::message::{AnyQuery, Command, Event, Query};
use crate::registry::{DispatcherBuilder, EventEntry, RequestEntry, SharedEvent};

/// Dispatches commands, queries, and events to their registered handlers.
///
/// The dispatcher owns the handler registrations but none of the handler
/// semantics: decorators are composed around handlers before registration,
/// and the dispatcher only resolves and invokes. Immutable once built;
/// share it behind an `Arc`.
pub struct Dispatcher {
    commands: HashMap<TypeId, RequestEntry>,
    queries: HashMap<TypeId, RequestEntry>,
    events: HashMap<TypeId, Vec<EventEntry>>,
}

impl Dispatcher {
    /// Starts an empty registration builder.
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    pub(crate) fn from_builder(builder: DispatcherBuilder) -> Self {
        Self {
            commands: builder.commands,
            queries: builder.queries,
            events: builder.events,
        }
    }

    /// Number of event handlers registered for `E`.
    pub fn event_handler_count<E: Event>(&self) -> usize {
        self.events
            .get(&TypeId::of::<E>())
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Dispatches a command to its single registered handler.
    #[tracing::instrument(level = "debug", skip_all, fields(command = std::any::type_name::<C>()))]
    pub async fn dispatch_command<C: Command>(
        &self,
        command: C,
        ctx: &DispatchContext,
    ) -> Result<()> {
        ctx.ensure_live()?;
        let entry = self.commands.get(&TypeId::of::<C>()).ok_or_else(|| {
            DispatchError::MissingHandler {
                kind: MessageKind::Command,
                type_name: std::any::type_name::<C>(),
            }
        })?;

        let outcome = (entry.invoker)(Box::new(command), ctx.clone()).await;
        self.finish(MessageKind::Command, outcome.map(|_| ()))
    }

    /// Dispatches a query to its single registered handler.
    #[tracing::instrument(level = "debug", skip_all, fields(query = std::any::type_name::<Q>()))]
    pub async fn dispatch_query<Q: Query>(
        &self,
        query: Q,
        ctx: &DispatchContext,
    ) -> Result<Q::Output> {
        ctx.ensure_live()?;
        let entry = self.queries.get(&TypeId::of::<Q>()).ok_or_else(|| {
            DispatchError::MissingHandler {
                kind: MessageKind::Query,
                type_name: std::any::type_name::<Q>(),
            }
        })?;

        let outcome = (entry.invoker)(Box::new(query), ctx.clone()).await;
        let response = self.finish(MessageKind::Query, outcome)?;
        response.downcast::<Q::Output>().map(|output| *output).map_err(|_| {
            DispatchError::InvalidArgument("query result type")
        })
    }

    /// Dispatches a query held behind an object-safe view, resolving the
    /// handler from the query's runtime type rather than a static type
    /// parameter.
    #[tracing::instrument(level = "debug", skip_all, fields(query = query.query_type_name()))]
    pub async fn dispatch_dyn_query<R: Send + 'static>(
        &self,
        query: Box<dyn AnyQuery<R>>,
        ctx: &DispatchContext,
    ) -> Result<R> {
        ctx.ensure_live()?;
        let type_name = query.query_type_name();
        let entry = self.queries.get(&query.query_type()).ok_or(
            DispatchError::MissingHandler {
                kind: MessageKind::Query,
                type_name,
            },
        )?;

        let outcome = (entry.invoker)(query.into_any(), ctx.clone()).await;
        let response = self.finish(MessageKind::Query, outcome)?;
        response
            .downcast::<R>()
            .map(|output| *output)
            .map_err(|_| DispatchError::InvalidArgument("query result type"))
    }

    /// Dispatches an event to every registered handler.
    ///
    /// Zero handlers is a successful no-op. With many handlers, every
    /// invocation is started before any is awaited and all run to
    /// completion; the joined failure carries the first fault. Every
    /// handler observes the same event instance.
    #[tracing::instrument(level = "debug", skip_all, fields(event = std::any::type_name::<E>()))]
    pub async fn dispatch_event<E: Event>(&self, event: E, ctx: &DispatchContext) -> Result<()> {
        ctx.ensure_live()?;
        let Some(entries) = self.events.get(&TypeId::of::<E>()) else {
            tracing::trace!("no handlers registered, completing");
            return Ok(());
        };

        let shared: SharedEvent = Arc::new(event);
        let invocations: Vec<_> = entries
            .iter()
            .map(|entry| (entry.invoker)(shared.clone(), ctx.clone()))
            .collect();

        let mut first_fault = None;
        for result in join_all(invocations).await {
            if let Err(fault) = result
                && first_fault.is_none()
            {
                first_fault = Some(fault);
            }
        }

        self.finish(
            MessageKind::Event,
            match first_fault {
                None => Ok(()),
                Some(fault) => Err(fault),
            },
        )
    }

    /// Classifies the raw outcome and records the dispatch metric.
    fn finish<T>(
        &self,
        kind: MessageKind,
        outcome: std::result::Result<T, crate::error::BoxError>,
    ) -> Result<T> {
        match outcome {
            Ok(value) => {
                metrics::counter!("dispatch_total", "kind" => kind_label(kind), "outcome" => "ok")
                    .increment(1);
                Ok(value)
            }
            Err(fault) => {
                let classified = DispatchError::classify(fault);
                metrics::counter!(
                    "dispatch_total",
                    "kind" => kind_label(kind),
                    "outcome" => classified.kind_label()
                )
                .increment(1);
                tracing::debug!(error = %classified, "dispatch failed");
                Err(classified)
            }
        }
    }
}

fn kind_label(kind: MessageKind) -> &'static str {
    match kind {
        MessageKind::Command => "command",
        MessageKind::Query => "query",
        MessageKind::Event => "event",
    }
}
