//! Command/query/event dispatch core.
//!
//! This crate provides:
//! - [`Command`], [`Query`], [`Event`] marker traits for the three message
//!   kinds
//! - [`Handle`] / [`EventHandler`] handler contracts
//! - [`DispatcherBuilder`] — an explicit handler registry keyed by the
//!   concrete message type
//! - [`Dispatcher`] — per-call handler resolution with a closed error
//!   taxonomy ([`DispatchError`])
//! - [`DispatchContext`] — cooperative cancellation and the ambient
//!   correlation scope

pub mod context;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod message;
pub mod registry;

pub use context::{CancellationToken, CorrelationGuard, CorrelationScope, DispatchContext};
pub use dispatcher::Dispatcher;
pub use error::{BoxError, DispatchError, MessageKind, Result, ValidationError};
pub use handler::{CommandHandler, EventHandler, Handle, QueryHandler, handler_fn};
pub use message::{AnyQuery, Command, Event, Query};
pub use registry::DispatcherBuilder;
