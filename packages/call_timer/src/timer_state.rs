//! Per-thread timing state.

use std::collections::HashMap;
use std::time::Duration;

use crate::{CallRecord, Report};

/// Where a [`TimerState`] is in its session lifecycle.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum SessionPhase {
    /// No session has been started on this thread yet.
    #[default]
    Uninitialized,

    /// A session has been started and is accumulating timing data.
    Active,

    /// The current session has been reported. Data stays available until the next reset.
    Reported,
}

/// Accumulated time and call count for one `(name, category)` pair.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct CallAggregate {
    pub(crate) name: String,
    pub(crate) category: String,
    pub(crate) total: Duration,
    pub(crate) calls: u64,
}

impl CallAggregate {
    fn add(&mut self, duration: Duration) {
        self.total = self.total.checked_add(duration).expect(
            "call time accumulation overflows Duration - this indicates an unrealistic scenario",
        );

        self.calls = self
            .calls
            .checked_add(1)
            .expect("call count overflows u64 - this indicates an unrealistic scenario");
    }
}

/// Timing data of the profiling session running on one thread.
///
/// Every thread owns exactly one `TimerState`, reachable through
/// [`with_timer_state()`](crate::with_timer_state). It holds the time aggregated per
/// `(name, category)` pair, the optional verbose call history and the reentrancy flag that
/// ensures only the outermost instrumented call on the thread is timed.
///
/// Most code never touches this type directly: [`Instrumented`](crate::Instrumented) records
/// into it and [`Session`](crate::Session) resets and reports it. The operations are public so
/// that custom instrumentation can follow the same protocol.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use call_timer::TimerState;
///
/// let mut state = TimerState::default();
/// state.reset("manual", false);
///
/// assert!(state.try_acquire());
/// state.record("db.query", "db", Duration::from_millis(20), "", "");
/// state.release();
///
/// assert_eq!(state.total_for("db.query", "db"), Duration::from_millis(20));
/// ```
#[derive(Debug, Default)]
pub struct TimerState {
    session_name: String,
    verbose: bool,
    call_records: Vec<CallRecord>,

    // In first-seen order, which is what report tie-breaking relies on.
    aggregates: Vec<CallAggregate>,

    // name -> category -> position in `aggregates`.
    index: HashMap<String, HashMap<String, usize>>,

    locked: bool,
    phase: SessionPhase,
    epoch: u64,
}

impl TimerState {
    /// Starts a new session, discarding everything recorded so far.
    ///
    /// Also clears the reentrancy flag, which recovers a thread whose lock was leaked by
    /// a call that skipped its release.
    pub fn reset(&mut self, session_name: impl Into<String>, verbose: bool) {
        self.session_name = session_name.into();
        self.verbose = verbose;
        self.call_records.clear();
        self.aggregates.clear();
        self.index.clear();
        self.locked = false;
        self.phase = SessionPhase::Active;
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Adds one call's duration to the `(name, category)` aggregate.
    ///
    /// In verbose sessions the call is also appended to the history, with `args` and `kwargs`
    /// as the rendered arguments. Non-verbose sessions ignore the rendered arguments.
    ///
    /// Only call this while holding the lock obtained from [`try_acquire()`](Self::try_acquire).
    pub fn record(
        &mut self,
        name: &str,
        category: &str,
        duration: Duration,
        args: &str,
        kwargs: &str,
    ) {
        let position = self.position_of(name, category);

        self.aggregates
            .get_mut(position)
            .expect("index is maintained together with the aggregates")
            .add(duration);

        if self.verbose {
            self.call_records.push(CallRecord::new(
                name.to_string(),
                duration,
                args.to_string(),
                kwargs.to_string(),
            ));
        }
    }

    fn position_of(&mut self, name: &str, category: &str) -> usize {
        if let Some(position) = self
            .index
            .get(name)
            .and_then(|categories| categories.get(category))
        {
            return *position;
        }

        let position = self.aggregates.len();
        self.aggregates.push(CallAggregate {
            name: name.to_string(),
            category: category.to_string(),
            ..CallAggregate::default()
        });

        self.index
            .entry(name.to_string())
            .or_default()
            .insert(category.to_string(), position);

        position
    }

    /// Takes the reentrancy lock if nobody on this thread holds it.
    ///
    /// Returns `true` if the caller is now the outermost timed call and must call
    /// [`release()`](Self::release) once done. Returns `false` for nested calls, which run
    /// untimed.
    pub fn try_acquire(&mut self) -> bool {
        if self.locked {
            return false;
        }

        self.locked = true;
        true
    }

    /// Releases the reentrancy lock.
    pub fn release(&mut self) {
        self.locked = false;
    }

    /// Whether an instrumented call on this thread is currently being timed.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Name given to the session at the last reset.
    #[must_use]
    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    /// Whether the session keeps a history of individual calls.
    #[must_use]
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Lifecycle phase of the session on this thread.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Total time recorded for the `(name, category)` pair, zero if never recorded.
    #[must_use]
    pub fn total_for(&self, name: &str, category: &str) -> Duration {
        self.aggregate(name, category)
            .map_or(Duration::ZERO, |aggregate| aggregate.total)
    }

    /// Number of timed calls recorded for the `(name, category)` pair.
    #[must_use]
    pub fn call_count_for(&self, name: &str, category: &str) -> u64 {
        self.aggregate(name, category)
            .map_or(0, |aggregate| aggregate.calls)
    }

    fn aggregate(&self, name: &str, category: &str) -> Option<&CallAggregate> {
        let position = *self.index.get(name)?.get(category)?;
        self.aggregates.get(position)
    }

    /// History of timed calls in the order they completed. Empty unless verbose.
    #[must_use]
    pub fn call_records(&self) -> &[CallRecord] {
        &self.call_records
    }

    /// Whether no call has been recorded since the last reset.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.aggregates.is_empty()
    }

    /// Builds a report from the data recorded so far.
    #[must_use]
    pub fn to_report(&self) -> Report {
        Report::from_aggregates(
            &self.session_name,
            &self.aggregates,
            self.verbose.then_some(self.call_records.as_slice()),
        )
    }

    pub(crate) fn mark_reported(&mut self) {
        self.phase = SessionPhase::Reported;
    }

    /// Identifies the current session. Changes on every reset.
    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }
}
