//! Shared value types for the dispatch framework.
//!
//! This crate provides the leaf abstractions the rest of the workspace
//! builds on:
//! - [`Optional`] — a value-or-absence-or-failure container replacing bare
//!   null-style handling
//! - [`Enumeration`] — type-safe enumeration values with lookup by name or
//!   value over an explicit member registry
//! - [`CorrelationId`] — identifier tying together all work for one
//!   logical request

pub mod correlation;
pub mod enumeration;
pub mod optional;

pub use correlation::{CorrelationId, ParseCorrelationIdError};
pub use enumeration::Enumeration;
pub use optional::{Fault, Optional};
