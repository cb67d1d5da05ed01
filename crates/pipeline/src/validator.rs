//! Validation rules and their ordered composite.

use std::marker::PhantomData;
use std::sync::Arc;

use dispatch::ValidationError;

/// One validation concern over requests of type `T`.
pub trait ValidatorRule<T>: Send + Sync {
    /// Position in the chain; lower runs earlier. Defaults to 0.
    fn order(&self) -> i32 {
        0
    }

    /// Checks the subject, rejecting it with a [`ValidationError`].
    fn validate(&self, subject: &T) -> Result<(), ValidationError>;
}

struct FnRule<F, T> {
    order: i32,
    name: &'static str,
    check: F,
    _marker: PhantomData<fn(&T)>,
}

impl<F, T> ValidatorRule<T> for FnRule<F, T>
where
    F: Fn(&T) -> Result<(), String> + Send + Sync,
    T: Send,
{
    fn order(&self) -> i32 {
        self.order
    }

    fn validate(&self, subject: &T) -> Result<(), ValidationError> {
        (self.check)(subject).map_err(|message| ValidationError::new(self.name, message))
    }
}

/// Adapts a closure into a named, ordered rule.
pub fn rule_fn<T, F>(order: i32, name: &'static str, check: F) -> Arc<dyn ValidatorRule<T>>
where
    T: Send + 'static,
    F: Fn(&T) -> Result<(), String> + Send + Sync + 'static,
{
    Arc::new(FnRule {
        order,
        name,
        check,
        _marker: PhantomData,
    })
}

/// An ordered set of rules applied in turn, short-circuiting on the first
/// failure.
///
/// Rules run in ascending [`ValidatorRule::order`]; ties keep insertion
/// order.
pub struct CompositeValidator<T> {
    rules: Vec<Arc<dyn ValidatorRule<T>>>,
}

impl<T> Default for CompositeValidator<T> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<T> Clone for CompositeValidator<T> {
    fn clone(&self) -> Self {
        Self {
            rules: self.rules.clone(),
        }
    }
}

impl<T> CompositeValidator<T> {
    /// An empty composite; validates everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule, keeping the set sorted. The sort is stable, so rules
    /// with equal order run in insertion order.
    pub fn with_rule(mut self, rule: Arc<dyn ValidatorRule<T>>) -> Self {
        self.rules.push(rule);
        self.rules.sort_by_key(|rule| rule.order());
        self
    }

    /// Runs every rule in order, stopping at the first failure.
    pub fn validate(&self, subject: &T) -> Result<(), ValidationError> {
        for rule in &self.rules {
            rule.validate(subject)?;
        }
        Ok(())
    }

    /// Number of rules in the composite.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True when no rules are registered.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
