//! Timing wrapper around callables.

use std::fmt::{self, Debug};

use crate::MethodKind;
use crate::guard::ReentrancyGuard;
use crate::pal::{Platform, PlatformFacade};

/// Rendering of keyword arguments for calls that have none.
const NO_KWARGS: &str = "{}";

/// Wraps `f` so that every call is timed into the current thread's profiling session.
///
/// The wrapper behaves exactly like `f`: it passes the arguments through, returns the same
/// value and lets panics propagate. The only addition is that the outermost instrumented call
/// on the thread records its wall clock duration under `(name, category)`. Instrumented calls
/// made from inside another instrumented call are not recorded separately, their time is
/// already part of the outer call.
///
/// Multiple positional arguments are passed as a tuple.
///
/// # Examples
///
/// ```
/// use call_timer::{Session, instrument};
///
/// let fetch = instrument("http.fetch", "http", |url: &str| url.len());
///
/// let report = Session::builder("example").build().begin();
/// assert_eq!(fetch.call("http://example.com"), 18);
/// let report = report.finish();
///
/// assert_eq!(report.calls().len(), 1);
/// ```
pub fn instrument<F>(name: impl Into<String>, category: impl Into<String>, f: F) -> Instrumented<F> {
    Instrumented::new(f, name.into(), category.into(), None, true)
}

/// Times an arbitrary closure as one instrumented call.
///
/// This is the protocol used by [`Instrumented`], exposed for code that cannot easily be
/// expressed as a wrapped function. `args` and `kwargs` are rendered into the call history
/// of verbose sessions.
///
/// # Examples
///
/// ```
/// use call_timer::{run_session, time_call, with_timer_state};
///
/// run_session("example", false, || {
///     let sum = time_call("math.sum", "cpu", &(1, 2), &(), || 1 + 2);
///     assert_eq!(sum, 3);
///
///     assert_eq!(with_timer_state(|state| state.call_count_for("math.sum", "cpu")), 1);
/// });
/// ```
pub fn time_call<R>(
    name: &str,
    category: &str,
    args: &dyn Debug,
    kwargs: &dyn Debug,
    f: impl FnOnce() -> R,
) -> R {
    measure(
        &PlatformFacade::real(),
        name,
        category,
        (),
        |()| (format!("{args:?}"), format!("{kwargs:?}")),
        |()| f(),
    )
}

/// Runs `call(args)`, timing it if the current thread is not already timing an outer call.
///
/// `render` produces the textual arguments and is only invoked for verbose sessions, before
/// the arguments are moved into the call.
fn measure<A, R>(
    platform: &PlatformFacade,
    name: &str,
    category: &str,
    args: A,
    render: impl FnOnce(&A) -> (String, String),
    call: impl FnOnce(A) -> R,
) -> R {
    let Some(guard) = ReentrancyGuard::try_acquire() else {
        return call(args);
    };

    let (args_text, kwargs_text) = if guard.is_verbose() {
        render(&args)
    } else {
        (String::new(), String::new())
    };

    let start = platform.now();
    let result = call(args);
    let elapsed = platform.now().saturating_sub(start);

    guard.finish(name, category, elapsed, &args_text, &kwargs_text);

    result
}

fn render_positional<A: Debug>(args: &A) -> (String, String) {
    (format!("{args:?}"), NO_KWARGS.to_string())
}

/// A callable wrapped with call timing.
///
/// Created by [`instrument()`] or by an instrumentation [`Target`](crate::Target). See
/// [`instrument()`] for the timing semantics.
///
/// The same wrapper can be shared between threads if the wrapped callable allows it. Each
/// thread records into its own session.
pub struct Instrumented<F> {
    f: F,
    name: String,
    category: String,
    kind: Option<MethodKind>,
    enabled: bool,
    platform: PlatformFacade,
}

impl<F> Instrumented<F> {
    pub(crate) fn new(
        f: F,
        name: String,
        category: String,
        kind: Option<MethodKind>,
        enabled: bool,
    ) -> Self {
        Self {
            f,
            name,
            category,
            kind,
            enabled,
            platform: PlatformFacade::real(),
        }
    }

    #[cfg(test)]
    #[must_use]
    pub(crate) fn with_platform(mut self, platform: PlatformFacade) -> Self {
        self.platform = platform;
        self
    }

    /// Name under which calls are recorded.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Category under which calls are recorded.
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Binding kind of the wrapped method, `None` for free functions.
    #[must_use]
    pub fn kind(&self) -> Option<MethodKind> {
        self.kind
    }

    /// Whether calls are timed. Disabled wrappers call straight through to the callable.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Unwraps the original callable.
    #[must_use]
    pub fn into_inner(self) -> F {
        self.f
    }

    /// Calls the wrapped function.
    pub fn call<A, R>(&self, args: A) -> R
    where
        F: Fn(A) -> R,
        A: Debug,
    {
        if !self.enabled {
            return (self.f)(args);
        }

        measure(
            &self.platform,
            &self.name,
            &self.category,
            args,
            render_positional,
            &self.f,
        )
    }

    /// Calls the wrapped function, which may mutate its captured state.
    pub fn call_mut<A, R>(&mut self, args: A) -> R
    where
        F: FnMut(A) -> R,
        A: Debug,
    {
        if !self.enabled {
            return (self.f)(args);
        }

        let Self {
            f,
            name,
            category,
            platform,
            ..
        } = self;

        measure(platform, name, category, args, render_positional, f)
    }

    /// Calls the wrapped function, consuming the wrapper.
    pub fn call_once<A, R>(self, args: A) -> R
    where
        F: FnOnce(A) -> R,
        A: Debug,
    {
        if !self.enabled {
            return (self.f)(args);
        }

        measure(
            &self.platform,
            &self.name,
            &self.category,
            args,
            render_positional,
            self.f,
        )
    }

    /// Calls a wrapped function that takes keyword-style options next to its positional
    /// arguments. Both are rendered separately in the call history.
    pub fn call_kw<A, K, R>(&self, args: A, kwargs: K) -> R
    where
        F: Fn(A, K) -> R,
        A: Debug,
        K: Debug,
    {
        if !self.enabled {
            return (self.f)(args, kwargs);
        }

        measure(
            &self.platform,
            &self.name,
            &self.category,
            (args, kwargs),
            |(args, kwargs)| (format!("{args:?}"), format!("{kwargs:?}")),
            |(args, kwargs)| (self.f)(args, kwargs),
        )
    }

    /// Calls a wrapped instance method on `receiver`.
    ///
    /// The receiver is not rendered into the call history, only `args` are.
    ///
    /// # Panics
    ///
    /// Panics if the wrapper was not created for a [`MethodKind::Instance`] method.
    pub fn call_on<S, A, R>(&self, receiver: &S, args: A) -> R
    where
        S: ?Sized,
        F: Fn(&S, A) -> R,
        A: Debug,
    {
        self.assert_takes_receiver();

        if !self.enabled {
            return (self.f)(receiver, args);
        }

        measure(
            &self.platform,
            &self.name,
            &self.category,
            args,
            render_positional,
            |args| (self.f)(receiver, args),
        )
    }

    /// Calls a wrapped instance method that mutates `receiver`.
    ///
    /// # Panics
    ///
    /// Panics if the wrapper was not created for a [`MethodKind::Instance`] method.
    pub fn call_on_mut<S, A, R>(&self, receiver: &mut S, args: A) -> R
    where
        S: ?Sized,
        F: Fn(&mut S, A) -> R,
        A: Debug,
    {
        self.assert_takes_receiver();

        if !self.enabled {
            return (self.f)(receiver, args);
        }

        measure(
            &self.platform,
            &self.name,
            &self.category,
            args,
            render_positional,
            |args| (self.f)(receiver, args),
        )
    }

    fn assert_takes_receiver(&self) {
        assert!(
            self.kind.is_some_and(MethodKind::takes_receiver),
            "{} is not an instance method and cannot be called on a receiver",
            self.name
        );
    }
}

impl<F> Clone for Instrumented<F>
where
    F: Clone,
{
    fn clone(&self) -> Self {
        Self {
            f: self.f.clone(),
            name: self.name.clone(),
            category: self.category.clone(),
            kind: self.kind,
            enabled: self.enabled,
            platform: self.platform.clone(),
        }
    }
}

impl<F> Debug for Instrumented<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instrumented")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("kind", &self.kind)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}
