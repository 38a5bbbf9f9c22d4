//! Call-level wall clock timing for development and diagnostics.
//!
//! This package measures how much time a program spends in selected functions and methods,
//! aggregates the timings by call name and by category (e.g. `"http"`, `"redis"`) and reports
//! the totals when a profiling session ends.
//!
//! The core functionality includes:
//! - [`instrument()`] and [`Target`] - Wrap callables so that every call is timed
//! - [`Session`] - Scopes one profiling run and emits its [`Report`] to a [`ReportSink`]
//! - [`Report`] - Category and call totals, sorted by time spent, plus an optional call history
//! - [`profile_checkpoints()`] - Attributes time to labeled points within one region of code
//!
//! This package is not meant for use in production, serving only as a development tool.
//!
//! # Simple Usage
//!
//! ```
//! use call_timer::{Session, instrument};
//!
//! # fn main() {
//! let fetch = instrument("http.fetch", "http", |url: &str| url.len());
//! let store = instrument("redis.set", "redis", |(key, value): (&str, usize)| {
//!     key.len() + value
//! });
//!
//! let active = Session::builder("page load").build().begin();
//!
//! let size = fetch.call("http://example.com/index.html");
//! store.call(("page", size));
//!
//! let report = active.finish();
//!
//! assert_eq!(report.categories().len(), 2);
//! assert_eq!(report.calls().len(), 2);
//! # }
//! ```
//!
//! # Nested calls
//!
//! Only the outermost instrumented call on a thread is timed. Instrumented calls made while
//! another one is running are executed normally but not recorded, so the time spent in them
//! is counted exactly once, as part of the outer call.
//!
//! # Verbose sessions
//!
//! A verbose session additionally keeps a history of every recorded call with its duration
//! and a `Debug` rendering of its arguments. The history is part of the report.
//!
//! ```
//! use call_timer::{Session, instrument};
//!
//! # fn main() {
//! let square = instrument("math.square", "cpu", |x: u64| x * x);
//!
//! let active = Session::builder("squares").verbose(true).build().begin();
//! square.call(3);
//! square.call(4);
//! let report = active.finish();
//!
//! let history = report.history().unwrap();
//! assert_eq!(history.len(), 2);
//! assert_eq!(history[1].args(), "4");
//! # }
//! ```
//!
//! # Threading
//!
//! Every thread has its own [`TimerState`]. Calls made on a thread are recorded into the
//! session running on that thread, if any. Reports of sessions that ran on different threads
//! can be combined with [`Report::merge()`].
//!
//! # Logging
//!
//! Reports are emitted through the `tracing` crate by default, at `INFO` level with the
//! `call_timer` target. Install a subscriber to see them.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod call_record;
mod checkpoints;
mod context;
mod error;
mod guard;
mod instrument;
mod pal;
mod report;
mod session;
mod sink;
mod target;
mod timer_state;

pub use call_record::CallRecord;
pub use checkpoints::{
    CheckpointRow, CheckpointStats, Checkpoints, checkpointed, profile_checkpoints,
};
pub use context::with_timer_state;
pub use error::{Error, Result};
pub use instrument::{Instrumented, instrument, time_call};
pub use report::{CallRow, CategoryRow, Report};
pub use session::{ActiveSession, ReportPolicy, Session, SessionBuilder, run_session};
pub use sink::{LogSink, ReportSink, WriterSink};
pub use target::{MethodKind, Target};
pub use timer_state::{SessionPhase, TimerState};
