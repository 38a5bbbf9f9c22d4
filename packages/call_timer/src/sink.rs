//! Destinations for finished reports.

use std::fmt::Debug;
use std::io::Write;
use std::sync::Mutex;

use crate::{Error, Report, Result};

/// Receives the report of every finished session.
///
/// Emission failures never abort the session. The session logs the error and still returns
/// the report to its caller.
pub trait ReportSink: Debug + Send + Sync {
    /// Emits one report.
    ///
    /// # Errors
    ///
    /// Returns an error if the report could not be delivered.
    fn emit(&self, report: &Report) -> Result<()>;
}

/// Emits reports as `tracing` events at `INFO` level.
///
/// The rendered report is the event message and the session name is attached as the
/// `session` field. This is the default sink of a [`Session`](crate::Session).
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl ReportSink for LogSink {
    #[cfg_attr(test, mutants::skip)] // Too difficult to test log output reliably - manually tested.
    fn emit(&self, report: &Report) -> Result<()> {
        tracing::info!(
            target: "call_timer",
            session = report.session_name(),
            "{report}"
        );

        Ok(())
    }
}

/// Writes rendered reports to an [`io::Write`](std::io::Write) destination.
///
/// # Examples
///
/// ```
/// use call_timer::{Session, WriterSink};
///
/// let sink = WriterSink::new(Vec::new());
/// let session = Session::builder("to a buffer").sink(sink).build();
/// session.run(|| {});
/// ```
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: Mutex<W>,
}

impl<W> WriterSink<W>
where
    W: Write + Send,
{
    /// Creates a sink that writes to `writer`.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Returns the writer.
    ///
    /// # Panics
    ///
    /// Panics if a thread panicked while writing a report.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .expect("report writer lock should not be poisoned")
    }
}

impl<W> ReportSink for WriterSink<W>
where
    W: Write + Send + Debug,
{
    fn emit(&self, report: &Report) -> Result<()> {
        // Must not panic: this may run while a failed session is unwinding.
        let mut writer = self.writer.lock().map_err(|_poisoned| Error::SinkUnavailable {
            sink: "writer".to_string(),
            reason: "a previous write panicked".to_string(),
        })?;

        write!(writer, "{report}")?;
        writer.flush()?;

        Ok(())
    }
}
