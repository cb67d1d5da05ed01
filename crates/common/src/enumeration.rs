//! Enumeration base machinery: closed sets of named constant values with
//! an integer value and a display name.
//!
//! Implementors declare their members as `const` items and hand back the
//! full set from [`Enumeration::members`]; every lookup and comparison is
//! derived from that explicit registry.

use std::cmp::Ordering;

use crate::optional::Optional;

/// A type-safe enumeration value: an integer `value` plus a `display_name`,
/// with lookup by either.
///
/// Members are equal when their values match and their display names match
/// case-insensitively. Ordering is by value, ties broken by ordinal display
/// name comparison.
///
/// # Example
///
/// ```
/// use common::Enumeration;
///
/// struct Severity {
///     value: i32,
///     name: &'static str,
/// }
///
/// impl Severity {
///     pub const INFO: Severity = Severity { value: 1, name: "Info" };
///     pub const WARNING: Severity = Severity { value: 2, name: "Warning" };
/// }
///
/// impl Enumeration for Severity {
///     fn value(&self) -> i32 { self.value }
///     fn display_name(&self) -> &'static str { self.name }
///     fn members() -> &'static [Self] { &[Severity::INFO, Severity::WARNING] }
/// }
///
/// let found = Severity::from_display_name("WARNING");
/// assert!(found.is_value());
/// ```
pub trait Enumeration: Sized + 'static {
    /// The integer value of this member.
    fn value(&self) -> i32;

    /// The human-readable name of this member.
    fn display_name(&self) -> &'static str;

    /// All members of this enumeration, in declaration order.
    fn members() -> &'static [Self];

    /// A restartable iterator over all members.
    fn all() -> std::slice::Iter<'static, Self> {
        Self::members().iter()
    }

    /// Looks up a member by display name, case-insensitively.
    ///
    /// An absent name is `Empty`, never an error.
    fn from_display_name(name: &str) -> Optional<&'static Self> {
        Self::members()
            .iter()
            .find(|member| member.display_name().eq_ignore_ascii_case(name))
            .into()
    }

    /// Looks up a member by its integer value.
    fn from_value(value: i32) -> Optional<&'static Self> {
        Self::members()
            .iter()
            .find(|member| member.value() == value)
            .into()
    }

    /// Structural equality: same value and case-insensitively equal name.
    fn eq_member(&self, other: &Self) -> bool {
        self.value() == other.value()
            && self.display_name().eq_ignore_ascii_case(other.display_name())
    }

    /// Orders by value, ties broken by ordinal display name comparison.
    fn compare(&self, other: &Self) -> Ordering {
        self.value()
            .cmp(&other.value())
            .then_with(|| self.display_name().cmp(other.display_name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Severity {
        value: i32,
        name: &'static str,
    }

    impl Severity {
        const DEBUG: Severity = Severity { value: 0, name: "Debug" };
        const INFO: Severity = Severity { value: 1, name: "Info" };
        const WARNING: Severity = Severity { value: 2, name: "Warning" };
        const ERROR: Severity = Severity { value: 3, name: "Error" };
    }

    impl Enumeration for Severity {
        fn value(&self) -> i32 {
            self.value
        }

        fn display_name(&self) -> &'static str {
            self.name
        }

        fn members() -> &'static [Self] {
            &[
                Severity::DEBUG,
                Severity::INFO,
                Severity::WARNING,
                Severity::ERROR,
            ]
        }
    }

    #[test]
    fn all_yields_every_member_and_restarts() {
        assert_eq!(Severity::all().count(), 4);
        // A second iteration starts over.
        assert_eq!(Severity::all().count(), 4);
    }

    #[test]
    fn from_display_name_is_case_insensitive() {
        let lower = Severity::from_display_name("warning").into_option().unwrap();
        let upper = Severity::from_display_name("WARNING").into_option().unwrap();
        assert!(lower.eq_member(upper));
        assert_eq!(lower.value(), 2);
    }

    #[test]
    fn from_display_name_absent_is_empty() {
        assert!(Severity::from_display_name("fatal").is_empty());
    }

    #[test]
    fn from_value_finds_exact_match() {
        let member = Severity::from_value(3).into_option().unwrap();
        assert_eq!(member.display_name(), "Error");
        assert!(Severity::from_value(99).is_empty());
    }

    #[test]
    fn equality_requires_value_and_name() {
        let a = Severity { value: 2, name: "Warning" };
        let b = Severity { value: 2, name: "WARNING" };
        let c = Severity { value: 2, name: "Caution" };
        assert!(a.eq_member(&b));
        assert!(!a.eq_member(&c));
    }

    #[test]
    fn ordering_is_by_value_then_name() {
        assert_eq!(Severity::INFO.compare(&Severity::WARNING), Ordering::Less);
        assert_eq!(Severity::ERROR.compare(&Severity::DEBUG), Ordering::Greater);

        let x = Severity { value: 1, name: "Alpha" };
        let y = Severity { value: 1, name: "Beta" };
        assert_eq!(x.compare(&y), Ordering::Less);
    }
}
