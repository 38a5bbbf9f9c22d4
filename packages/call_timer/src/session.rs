use std::marker::PhantomData;
use std::sync::Arc;

use crate::{LogSink, Report, ReportSink, with_timer_state};

/// Decides whether a session that ends in failure still emits its report.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum ReportPolicy {
    /// Report only when the session body completes successfully. Data recorded by a failed
    /// session is discarded at the next reset.
    #[default]
    OnSuccess,

    /// Report on every exit path, including a body that returns `Err` or panics.
    Always,
}

/// Runs `body` as a profiling session on the current thread and reports it to the log.
///
/// Shorthand for `Session::builder(name).verbose(verbose).build().run(body)`.
///
/// # Examples
///
/// ```
/// use call_timer::{instrument, run_session};
///
/// let add = instrument("math.add", "cpu", |(a, b): (u32, u32)| a + b);
///
/// let sum = run_session("adding", true, || add.call((2, 3)));
/// assert_eq!(sum, 5);
/// ```
pub fn run_session<R>(name: impl Into<String>, verbose: bool, body: impl FnOnce() -> R) -> R {
    Session::builder(name).verbose(verbose).build().run(body)
}

/// Configures a [`Session`].
#[derive(Debug)]
pub struct SessionBuilder {
    name: String,
    verbose: bool,
    report_policy: ReportPolicy,
    sink: Arc<dyn ReportSink>,
}

impl SessionBuilder {
    /// Whether to keep the history of individual calls and their arguments. Off by default.
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// When to report sessions that end in failure. Defaults to [`ReportPolicy::OnSuccess`].
    #[must_use]
    pub fn report_policy(mut self, report_policy: ReportPolicy) -> Self {
        self.report_policy = report_policy;
        self
    }

    /// Where to emit reports. Defaults to [`LogSink`].
    #[must_use]
    pub fn sink(mut self, sink: impl ReportSink + 'static) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    /// Creates the session.
    #[must_use]
    pub fn build(self) -> Session {
        Session {
            name: self.name,
            verbose: self.verbose,
            report_policy: self.report_policy,
            sink: self.sink,
        }
    }
}

/// A profiling session definition: name, verbosity, report policy and report sink.
///
/// Running the session resets the current thread's [`TimerState`](crate::TimerState), lets
/// the body make instrumented calls and finally emits a [`Report`] to the sink. The same
/// session can be run any number of times and on any thread; every run starts from empty
/// data on the thread it runs on.
///
/// # Examples
///
/// ```
/// use call_timer::{ReportPolicy, Session, instrument};
///
/// let lookup = instrument("cache.lookup", "cache", |key: &str| key.len());
///
/// let session = Session::builder("lookups")
///     .verbose(true)
///     .report_policy(ReportPolicy::Always)
///     .build();
///
/// let found = session.run(|| lookup.call("user:1"));
/// assert_eq!(found, 6);
/// ```
#[derive(Clone, Debug)]
pub struct Session {
    name: String,
    verbose: bool,
    report_policy: ReportPolicy,
    sink: Arc<dyn ReportSink>,
}

impl Session {
    /// Starts configuring a session with the given name.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> SessionBuilder {
        SessionBuilder {
            name: name.into(),
            verbose: false,
            report_policy: ReportPolicy::default(),
            sink: Arc::new(LogSink),
        }
    }

    /// Name shown in the report header.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the session keeps a call history.
    #[must_use]
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// When the session reports on failure.
    #[must_use]
    pub fn report_policy(&self) -> ReportPolicy {
        self.report_policy
    }

    /// Resets the current thread's timing data and starts accumulating into this session.
    ///
    /// The returned guard must be finished with [`ActiveSession::finish()`] to report
    /// the session. Dropping it unfinished counts as a failure.
    pub fn begin(&self) -> ActiveSession {
        with_timer_state(|state| state.reset(self.name.as_str(), self.verbose));

        tracing::debug!(
            target: "call_timer",
            session = %self.name,
            verbose = self.verbose,
            "profiling session started"
        );

        ActiveSession {
            session: self.clone(),
            finished: false,
            _single_threaded: PhantomData,
        }
    }

    /// Runs `body` as one session and returns its result.
    ///
    /// If `body` panics, the panic propagates after the report policy has been applied.
    pub fn run<R>(&self, body: impl FnOnce() -> R) -> R {
        let active = self.begin();
        let result = body();
        active.finish();
        result
    }

    /// Runs a fallible `body` as one session.
    ///
    /// An `Ok` result is reported. An `Err` is only reported under [`ReportPolicy::Always`].
    /// Either way the result is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns the error returned by `body`.
    pub fn try_run<T, E>(&self, body: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
        let active = self.begin();

        match body() {
            Ok(value) => {
                active.finish();
                Ok(value)
            }
            Err(error) => {
                // Dropping unfinished applies the report policy.
                drop(active);
                Err(error)
            }
        }
    }

    fn conclude(&self) -> Report {
        let report = with_timer_state(|state| {
            state.mark_reported();
            state.to_report()
        });

        if let Err(error) = self.sink.emit(&report) {
            tracing::warn!(
                target: "call_timer",
                session = %self.name,
                %error,
                "failed to emit profiling report"
            );
        }

        report
    }
}

/// A session that is accumulating timing data on the current thread.
///
/// Created by [`Session::begin()`]. Call [`finish()`](Self::finish) on success. If the guard is
/// dropped without finishing (an early return or a panic), the report is emitted only under
/// [`ReportPolicy::Always`].
#[derive(Debug)]
#[must_use = "the session ends when the guard is dropped; call finish() to report it"]
pub struct ActiveSession {
    session: Session,
    finished: bool,

    _single_threaded: PhantomData<*const ()>,
}

impl ActiveSession {
    /// Ends the session, emits its report to the sink and returns it.
    ///
    /// The report is returned even if the sink fails to emit it.
    pub fn finish(mut self) -> Report {
        self.finished = true;
        self.session.conclude()
    }
}

impl Drop for ActiveSession {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        match self.session.report_policy {
            ReportPolicy::Always => {
                self.session.conclude();
            }
            ReportPolicy::OnSuccess => {
                tracing::debug!(
                    target: "call_timer",
                    session = %self.session.name,
                    "profiling session ended without finishing, report discarded"
                );
            }
        }
    }
}
