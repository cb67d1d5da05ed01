//! Validator chain and decorator pipeline for dispatch handlers.
//!
//! This crate provides:
//! - [`ValidatorRule`] / [`CompositeValidator`] — ordered validation rules
//!   applied before a handler runs
//! - [`EventRegistrar`] — the per-scope arm/fire-once notification slot
//! - The five decorators ([`Validating`], [`Transacting`], [`Persisting`],
//!   [`Registering`], [`Correlating`]) and the [`Pipeline`] builder that
//!   composes them around an inner handler in an explicit order

pub mod decorate;
pub mod registrar;
pub mod validator;

pub use decorate::{
    Correlating, Persisting, Pipeline, Registering, Transacting, Transactional, Validating, Wrap,
};
pub use registrar::{EventRegistrar, Notification, RegistrarError};
pub use validator::{CompositeValidator, ValidatorRule, rule_fn};
