use std::fmt;
use std::time::Duration;

/// One timed call, kept in the session history when the session is verbose.
///
/// The arguments are stored as their `Debug` rendering captured just before the call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CallRecord {
    name: String,
    duration: Duration,
    args: String,
    kwargs: String,
}

impl CallRecord {
    #[must_use]
    pub(crate) fn new(name: String, duration: Duration, args: String, kwargs: String) -> Self {
        Self {
            name,
            duration,
            args,
            kwargs,
        }
    }

    /// Qualified name of the called function.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wall clock time the call took, including any nested instrumented calls.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Rendering of the positional arguments.
    #[must_use]
    pub fn args(&self) -> &str {
        &self.args
    }

    /// Rendering of the keyword arguments, `{}` if the call had none.
    #[must_use]
    pub fn kwargs(&self) -> &str {
        &self.kwargs
    }
}

impl fmt::Display for CallRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.4}s {}[args={} kwargs={}]",
            self.duration.as_secs_f64(),
            self.name,
            self.args,
            self.kwargs
        )
    }
}
