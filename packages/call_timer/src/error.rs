use std::io;

use thiserror::Error;

/// Errors that can occur when emitting a profiling report.
///
/// Recorded timing data is never lost because of these errors. The session that produced
/// the report still returns it to the caller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Writing the rendered report to its destination failed.
    #[error("failed to write profiling report: {0}")]
    Io(#[from] io::Error),

    /// The sink is not able to accept reports at the moment.
    #[error("report sink '{sink}' is unavailable: {reason}")]
    SinkUnavailable {
        /// Human-readable name of the sink.
        sink: String,

        /// A human-readable description of why the sink cannot accept the report.
        reason: String,
    },
}

/// A specialized `Result` type for report emission, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;
