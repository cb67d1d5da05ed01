//! A value-or-absence-or-failure container used throughout the framework
//! in place of bare `Option` where a failed lookup must stay distinct from
//! an absent one.

use std::fmt;
use std::sync::Arc;

/// A captured failure. Shared so an `Optional` stays clonable when its
/// value type is.
pub type Fault = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Three-state container: a present value, an explicit absence, or a
/// captured failure.
///
/// Exactly one state holds at a time and the container is immutable once
/// built. Chained transformations never touch the `Empty` and `Failed`
/// states other than to pass them through, so absence and failure travel
/// structurally instead of via early returns. The conversion back into a
/// plain `Result` happens at the [`Optional::reduce`] / [`Optional::require`]
/// boundary.
#[derive(Clone)]
pub enum Optional<T> {
    /// A value is present.
    Value(T),
    /// No value; a legitimate, non-error outcome.
    Empty,
    /// Producing the value failed.
    Failed(Fault),
}

impl<T> Optional<T> {
    /// Wraps a present value.
    pub fn value(value: T) -> Self {
        Optional::Value(value)
    }

    /// The absent state.
    pub fn empty() -> Self {
        Optional::Empty
    }

    /// Captures a failure.
    pub fn failed<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Optional::Failed(Arc::new(error))
    }

    /// Captures an already-shared failure, re-typing it for a different
    /// value type.
    pub fn from_fault(fault: Fault) -> Self {
        Optional::Failed(fault)
    }

    /// Returns true if a value is present.
    pub fn is_value(&self) -> bool {
        matches!(self, Optional::Value(_))
    }

    /// Returns true in the absent state.
    pub fn is_empty(&self) -> bool {
        matches!(self, Optional::Empty)
    }

    /// Returns true in the failed state.
    pub fn is_failed(&self) -> bool {
        matches!(self, Optional::Failed(_))
    }

    /// Transforms the contained value. `Empty` stays `Empty`; `Failed`
    /// propagates the same fault re-typed.
    pub fn map<U, F>(self, f: F) -> Optional<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Optional::Value(value) => Optional::Value(f(value)),
            Optional::Empty => Optional::Empty,
            Optional::Failed(fault) => Optional::Failed(fault),
        }
    }

    /// Monadic bind: like [`Optional::map`] but the transformation itself
    /// produces an `Optional`.
    pub fn and_then<U, F>(self, f: F) -> Optional<U>
    where
        F: FnOnce(T) -> Optional<U>,
    {
        match self {
            Optional::Value(value) => f(value),
            Optional::Empty => Optional::Empty,
            Optional::Failed(fault) => Optional::Failed(fault),
        }
    }

    /// Resolves the container: the value, the fallback for `Empty`, or the
    /// captured fault as an error.
    pub fn reduce<F>(self, fallback: F) -> Result<T, Fault>
    where
        F: FnOnce() -> T,
    {
        match self {
            Optional::Value(value) => Ok(value),
            Optional::Empty => Ok(fallback()),
            Optional::Failed(fault) => Err(fault),
        }
    }

    /// The absent-but-required boundary: `Empty` becomes the supplied
    /// fault, a present value passes through, and an existing fault wins
    /// over the supplied one.
    pub fn require<F>(self, missing: F) -> Result<T, Fault>
    where
        F: FnOnce() -> Fault,
    {
        match self {
            Optional::Value(value) => Ok(value),
            Optional::Empty => Err(missing()),
            Optional::Failed(fault) => Err(fault),
        }
    }

    /// Runs `action` only in the absent state. Returns `self` for chaining.
    pub fn when_empty<F>(self, action: F) -> Self
    where
        F: FnOnce(),
    {
        if self.is_empty() {
            action();
        }
        self
    }

    /// Runs `action` with the fault only in the failed state. Returns
    /// `self` for chaining.
    pub fn when_failed<F>(self, action: F) -> Self
    where
        F: FnOnce(&Fault),
    {
        if let Optional::Failed(fault) = &self {
            action(fault);
        }
        self
    }

    /// Borrows the contained value without consuming the container.
    pub fn as_ref(&self) -> Optional<&T> {
        match self {
            Optional::Value(value) => Optional::Value(value),
            Optional::Empty => Optional::Empty,
            Optional::Failed(fault) => Optional::Failed(fault.clone()),
        }
    }

    /// Collapses into a plain `Option`, discarding any fault.
    pub fn into_option(self) -> Option<T> {
        match self {
            Optional::Value(value) => Some(value),
            _ => None,
        }
    }
}

impl<T> From<Option<T>> for Optional<T> {
    fn from(option: Option<T>) -> Self {
        match option {
            Some(value) => Optional::Value(value),
            None => Optional::Empty,
        }
    }
}

impl<T> From<T> for Optional<T> {
    fn from(value: T) -> Self {
        Optional::Value(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Optional<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Optional::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Optional::Empty => f.write_str("Empty"),
            Optional::Failed(fault) => f.debug_tuple("Failed").field(fault).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("lookup failed: {0}")]
    struct LookupError(&'static str);

    #[test]
    fn map_applies_only_to_value() {
        let doubled = Optional::value(21).map(|v| v * 2);
        assert!(matches!(doubled, Optional::Value(42)));
    }

    #[test]
    fn empty_maps_to_empty_regardless_of_function() {
        let mapped = Optional::<i32>::empty().map(|_| panic!("must not run"));
        assert!(mapped.is_empty());
    }

    #[test]
    fn failed_maps_to_same_fault_regardless_of_function() {
        let failed = Optional::<i32>::failed(LookupError("boom"));
        let mapped: Optional<String> = failed.map(|_| panic!("must not run"));
        match mapped {
            Optional::Failed(fault) => assert_eq!(fault.to_string(), "lookup failed: boom"),
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn and_then_chains_and_short_circuits() {
        let present = Optional::value(2).and_then(|v| Optional::value(v + 1));
        assert!(matches!(present, Optional::Value(3)));

        let absent: Optional<i32> =
            Optional::empty().and_then(|_: i32| panic!("must not run"));
        assert!(absent.is_empty());
    }

    #[test]
    fn reduce_falls_back_only_for_empty() {
        assert_eq!(Optional::value(1).reduce(|| 9).unwrap(), 1);
        assert_eq!(Optional::<i32>::empty().reduce(|| 9).unwrap(), 9);

        let failed = Optional::<i32>::failed(LookupError("down"));
        assert!(failed.reduce(|| 9).is_err());
    }

    #[test]
    fn require_converts_absence_into_fault() {
        let err = Optional::<i32>::empty()
            .require(|| Arc::new(LookupError("missing")) as Fault)
            .unwrap_err();
        assert_eq!(err.to_string(), "lookup failed: missing");

        assert_eq!(
            Optional::value(7)
                .require(|| Arc::new(LookupError("missing")) as Fault)
                .unwrap(),
            7
        );
    }

    #[test]
    fn require_keeps_the_original_fault() {
        let err = Optional::<i32>::failed(LookupError("original"))
            .require(|| Arc::new(LookupError("missing")) as Fault)
            .unwrap_err();
        assert_eq!(err.to_string(), "lookup failed: original");
    }

    #[test]
    fn hooks_fire_only_in_matching_state() {
        let mut empty_seen = false;
        let mut fault_seen = false;

        Optional::<i32>::empty()
            .when_empty(|| empty_seen = true)
            .when_failed(|_| panic!("must not run"));
        assert!(empty_seen);

        Optional::<i32>::failed(LookupError("x"))
            .when_empty(|| panic!("must not run"))
            .when_failed(|_| fault_seen = true);
        assert!(fault_seen);

        Optional::value(1)
            .when_empty(|| panic!("must not run"))
            .when_failed(|_| panic!("must not run"));
    }

    #[test]
    fn nullable_conversion() {
        assert!(Optional::<i32>::from(Some(5)).is_value());
        assert!(Optional::<i32>::from(None).is_empty());
    }
}
