//! Instrumentation targets: owners of functions and methods that get wrapped together.

use std::fmt;

use crate::Instrumented;

/// How a method is bound to its type.
///
/// The tag travels with the [`Instrumented`] wrapper so the wrapped method keeps its calling
/// convention: only instance methods are called with a receiver.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum MethodKind {
    /// Takes `&self` or `&mut self`.
    Instance,

    /// Associated function that conceptually operates on the type (e.g. a constructor).
    Class,

    /// Associated function unrelated to any instance or the type itself.
    Static,
}

impl MethodKind {
    /// Whether the method is called with a receiver.
    #[must_use]
    pub const fn takes_receiver(self) -> bool {
        matches!(self, Self::Instance)
    }
}

/// A module or type whose members are wrapped with call timing under one category.
///
/// Members are named `<owner>.<member>` for module functions and
/// `<owner>.<class>.<member>` for methods. By default every member is instrumented except
/// names starting with `_`. Use [`only()`](Self::only) to instrument an explicit list instead;
/// members outside the list still get a wrapper, but it calls straight through untimed.
///
/// # Examples
///
/// ```
/// use call_timer::{MethodKind, Target, run_session, with_timer_state};
///
/// struct Store;
///
/// impl Store {
///     fn get(&self, key: &str) -> Option<String> {
///         Some(key.to_uppercase())
///     }
/// }
///
/// let store_target = Target::class("cache", "Store", "redis");
/// let get = store_target.method("get", MethodKind::Instance, |store: &Store, key: &str| {
///     store.get(key)
/// });
/// assert_eq!(get.name(), "cache.Store.get");
///
/// run_session("cache demo", false, || {
///     get.call_on(&Store, "foo");
///
///     let calls = with_timer_state(|state| state.call_count_for("cache.Store.get", "redis"));
///     assert_eq!(calls, 1);
/// });
/// ```
#[derive(Clone, Debug)]
pub struct Target {
    owner: String,
    class_name: Option<String>,
    category: String,
    selected: Option<Vec<String>>,
}

impl Target {
    /// A module whose free functions are instrumented.
    #[must_use]
    pub fn module(owner: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            class_name: None,
            category: category.into(),
            selected: None,
        }
    }

    /// A type, defined in `owner`, whose methods are instrumented.
    #[must_use]
    pub fn class(
        owner: impl Into<String>,
        class_name: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            class_name: Some(class_name.into()),
            category: category.into(),
            selected: None,
        }
    }

    /// Restricts instrumentation to the listed members.
    #[must_use]
    pub fn only<I, S>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected = Some(members.into_iter().map(Into::into).collect());
        self
    }

    /// Category recorded for every member of this target.
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Whether calls to `member` are timed.
    #[must_use]
    pub fn is_selected(&self, member: &str) -> bool {
        match &self.selected {
            Some(selected) => selected.iter().any(|s| s == member),
            None => !member.starts_with('_'),
        }
    }

    /// Fully qualified name of `member`, as it appears in reports.
    #[must_use]
    pub fn qualified_name(&self, member: &str) -> String {
        match &self.class_name {
            Some(class_name) => format!("{}.{class_name}.{member}", self.owner),
            None => format!("{}.{member}", self.owner),
        }
    }

    /// Wraps a free function of this target.
    pub fn function<F>(&self, member: &str, f: F) -> Instrumented<F> {
        self.wrap(member, None, f)
    }

    /// Wraps a method of this target, remembering how it is bound.
    pub fn method<F>(&self, member: &str, kind: MethodKind, f: F) -> Instrumented<F> {
        self.wrap(member, Some(kind), f)
    }

    fn wrap<F>(&self, member: &str, kind: Option<MethodKind>, f: F) -> Instrumented<F> {
        Instrumented::new(
            f,
            self.qualified_name(member),
            self.category.clone(),
            kind,
            self.is_selected(member),
        )
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.class_name {
            Some(class_name) => write!(f, "{}.{class_name} ({})", self.owner, self.category),
            None => write!(f, "{} ({})", self.owner, self.category),
        }
    }
}
