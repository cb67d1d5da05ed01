//! Data-context and request-context collaborators.
//!
//! This crate provides the in-process contracts the decorator pipeline
//! persists and scopes through:
//! - [`DataContext`] / [`Repository`] — staged changes with a single
//!   "persist everything pending" operation
//! - [`TransactionScope`] — commit-or-rollback guard over a context
//! - [`RequestAccessor`] — absent-safe view of the current HTTP request
//! - [`InMemoryDataContext`] — in-memory implementation for tests and
//!   single-process use

pub mod data;
pub mod error;
pub mod memory;
pub mod request;
pub mod transaction;

pub use data::{DataContext, Entity, EntityMutation, EntityPredicate, Repository};
pub use error::{ContextError, Result};
pub use memory::{InMemoryDataContext, InMemoryRepository};
pub use request::{RequestAccessor, RequestSnapshot, StaticRequestAccessor};
pub use transaction::{TransactionOptions, TransactionScope, TransactionTimeout};
