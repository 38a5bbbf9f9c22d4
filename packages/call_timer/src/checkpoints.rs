//! Scoped per-checkpoint timing of a region of code.
//!
//! This is independent of the call timing sessions: it keeps its own state for the duration
//! of one region and never touches the thread's [`TimerState`](crate::TimerState).

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::pal::{Platform, PlatformFacade};

/// Marks a checkpoint labeled with the current source file and line.
///
/// # Examples
///
/// ```
/// use call_timer::{checkpoint, profile_checkpoints};
///
/// let total = profile_checkpoints("summing", |probe| {
///     let numbers: Vec<u64> = (0..1000).collect();
///     checkpoint!(probe);
///     let total: u64 = numbers.iter().sum();
///     checkpoint!(probe);
///     total
/// });
///
/// assert_eq!(total, 499_500);
/// ```
#[macro_export]
macro_rules! checkpoint {
    ($probe:expr) => {
        $probe.mark(::core::concat!(::core::file!(), ":", ::core::line!()))
    };
}

/// Runs `body` with a [`Checkpoints`] probe and logs the per-checkpoint statistics at `INFO`
/// level once `body` returns.
///
/// Time between two marks is attributed to the later mark. Time after the last mark only
/// counts towards the region total.
pub fn profile_checkpoints<R>(target: &str, body: impl FnOnce(&mut Checkpoints) -> R) -> R {
    let mut checkpoints = Checkpoints::start(target, PlatformFacade::real());
    let result = body(&mut checkpoints);
    let stats = checkpoints.stats();

    tracing::info!(target: "call_timer", region = target, "{stats}");

    result
}

/// Wraps `f` so that every call is profiled as its own checkpoint region.
///
/// # Examples
///
/// ```
/// use call_timer::{checkpoint, checkpointed};
///
/// let sum_up_to = checkpointed("sum", |probe, n: u64| {
///     let numbers: Vec<u64> = (1..=n).collect();
///     checkpoint!(probe);
///     numbers.iter().sum::<u64>()
/// });
///
/// assert_eq!(sum_up_to(4), 10);
/// assert_eq!(sum_up_to(10), 55);
/// ```
pub fn checkpointed<A, R>(
    target: impl Into<String>,
    f: impl Fn(&mut Checkpoints, A) -> R,
) -> impl Fn(A) -> R {
    let target = target.into();
    move |args| profile_checkpoints(&target, |probe| f(probe, args))
}

/// Attributes elapsed time to labeled points in a region of code.
#[derive(Debug)]
pub struct Checkpoints {
    target: String,
    platform: PlatformFacade,
    region_start: Duration,
    last_mark: Duration,

    // In first-seen order.
    rows: Vec<CheckpointRow>,
    index: HashMap<&'static str, usize>,
}

impl Checkpoints {
    pub(crate) fn start(target: &str, platform: PlatformFacade) -> Self {
        let now = platform.now();

        Self {
            target: target.to_string(),
            platform,
            region_start: now,
            last_mark: now,
            rows: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Attributes the time since the previous mark, or since the region started, to `label`.
    pub fn mark(&mut self, label: &'static str) {
        let now = self.platform.now();
        let elapsed = now.saturating_sub(self.last_mark);
        self.last_mark = now;

        let position = *self.index.entry(label).or_insert_with(|| {
            self.rows.push(CheckpointRow {
                label,
                hits: 0,
                total: Duration::ZERO,
            });
            self.rows.len().saturating_sub(1)
        });

        let row = self
            .rows
            .get_mut(position)
            .expect("positions are assigned as rows are pushed");

        row.hits = row
            .hits
            .checked_add(1)
            .expect("checkpoint hit count overflows u64 - this indicates an unrealistic scenario");
        row.total = row.total.checked_add(elapsed).expect(
            "checkpoint time overflows Duration - this indicates an unrealistic scenario",
        );
    }

    /// Statistics gathered so far.
    #[must_use]
    pub fn stats(&self) -> CheckpointStats {
        CheckpointStats {
            target: self.target.clone(),
            total: self.platform.now().saturating_sub(self.region_start),
            rows: self.rows.clone(),
        }
    }
}

/// Time attributed to one checkpoint.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CheckpointRow {
    label: &'static str,
    hits: u64,
    total: Duration,
}

impl CheckpointRow {
    /// Label passed to [`Checkpoints::mark()`].
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// How many times the checkpoint was reached.
    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Total time attributed to the checkpoint.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.total
    }

    /// Mean time per hit.
    #[must_use]
    pub fn per_hit(&self) -> Duration {
        match u32::try_from(self.hits) {
            Ok(0) => Duration::ZERO,
            Ok(hits) => self.total.checked_div(hits).unwrap_or_default(),
            Err(_) => Duration::from_nanos(
                u64::try_from(
                    self.total
                        .as_nanos()
                        .checked_div(u128::from(self.hits))
                        .expect("guarded by match arm"),
                )
                .expect("all realistic values fit in u64"),
            ),
        }
    }
}

/// Per-checkpoint statistics of a profiled region.
#[derive(Clone, Debug)]
pub struct CheckpointStats {
    target: String,
    total: Duration,
    rows: Vec<CheckpointRow>,
}

impl CheckpointStats {
    /// Name of the profiled region.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Time from the start of the region until the statistics were taken.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.total
    }

    /// Checkpoints in the order they were first reached.
    #[must_use]
    pub fn rows(&self) -> &[CheckpointRow] {
        &self.rows
    }

    /// Share of the region total attributed to `row`, in percent.
    #[must_use]
    pub fn percent_of_total(&self, row: &CheckpointRow) -> f64 {
        if self.total.is_zero() {
            return 0.0;
        }

        row.total.as_secs_f64() / self.total.as_secs_f64() * 100.0
    }
}

impl fmt::Display for CheckpointStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Region: {}", self.target)?;
        writeln!(f, "Total time: {:.6} s", self.total.as_secs_f64())?;
        writeln!(f)?;

        let label_width = self
            .rows
            .iter()
            .map(|row| row.label.chars().count())
            .chain(["Checkpoint".len()])
            .max()
            .unwrap_or_default();

        writeln!(
            f,
            "{:<label_width$}  {:>8}  {:>10}  {:>10}  {:>6}",
            "Checkpoint", "Hits", "Time", "Per Hit", "% Time"
        )?;

        for row in &self.rows {
            writeln!(
                f,
                "{:<label_width$}  {:>8}  {:>10.6}  {:>10.6}  {:>6.1}",
                row.label,
                row.hits,
                row.total.as_secs_f64(),
                row.per_hit().as_secs_f64(),
                self.percent_of_total(row)
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::pal::FakePlatform;

    fn fake_checkpoints(clock: &FakePlatform) -> Checkpoints {
        Checkpoints::start("region", PlatformFacade::fake(clock.clone()))
    }

    #[test]
    fn attributes_time_to_following_mark() {
        let clock = FakePlatform::new();
        let mut checkpoints = fake_checkpoints(&clock);

        clock.advance(Duration::from_millis(10));
        checkpoints.mark("a");
        clock.advance(Duration::from_millis(30));
        checkpoints.mark("b");
        clock.advance(Duration::from_millis(10));
        checkpoints.mark("a");

        let stats = checkpoints.stats();
        let rows = stats.rows();

        assert_eq!(rows.len(), 2);

        let a = rows.first().unwrap();
        assert_eq!(a.label(), "a");
        assert_eq!(a.hits(), 2);
        assert_eq!(a.total(), Duration::from_millis(20));
        assert_eq!(a.per_hit(), Duration::from_millis(10));

        let b = rows.get(1).unwrap();
        assert_eq!(b.label(), "b");
        assert_eq!(b.hits(), 1);
        assert_eq!(b.total(), Duration::from_millis(30));

        assert_eq!(stats.total(), Duration::from_millis(50));
        assert!((stats.percent_of_total(a) - 40.0).abs() < 1e-9);
        assert!((stats.percent_of_total(b) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn tail_after_last_mark_counts_only_in_total() {
        let clock = FakePlatform::new();
        let mut checkpoints = fake_checkpoints(&clock);

        clock.advance(Duration::from_millis(5));
        checkpoints.mark("only");
        clock.advance(Duration::from_millis(15));

        let stats = checkpoints.stats();
        assert_eq!(stats.total(), Duration::from_millis(20));
        assert_eq!(stats.rows().first().unwrap().total(), Duration::from_millis(5));
    }

    #[test]
    fn empty_region_has_no_rows() {
        let clock = FakePlatform::new();
        let stats = fake_checkpoints(&clock).stats();

        assert!(stats.rows().is_empty());
        assert_eq!(stats.total(), Duration::ZERO);
        assert!(stats.to_string().contains("Checkpoint"));
    }

    #[test]
    fn zero_total_gives_zero_percent() {
        let clock = FakePlatform::new();
        let mut checkpoints = fake_checkpoints(&clock);
        checkpoints.mark("instant");

        let stats = checkpoints.stats();
        let row = stats.rows().first().unwrap();
        assert!(stats.percent_of_total(row).abs() < f64::EPSILON);
    }

    #[test]
    fn macro_labels_with_file_and_line() {
        let clock = FakePlatform::new();
        let mut checkpoints = fake_checkpoints(&clock);

        checkpoint!(checkpoints);

        let stats = checkpoints.stats();
        let label = stats.rows().first().unwrap().label();
        assert!(label.starts_with(file!()));
        assert!(label.contains(':'));
    }

    #[test]
    fn display_lists_rows() {
        let clock = FakePlatform::new();
        let mut checkpoints = fake_checkpoints(&clock);
        clock.advance(Duration::from_millis(2));
        checkpoints.mark("parse");

        let text = checkpoints.stats().to_string();
        assert!(text.contains("Region: region"));
        assert!(text.contains("parse"));
        assert!(text.contains("100.0"));
    }

    #[test]
    fn checkpointed_profiles_every_call() {
        let double = checkpointed("double", |probe, x: u32| {
            probe.mark("doubling");
            x.saturating_mul(2)
        });

        assert_eq!(double(2), 4);
        assert_eq!(double(5), 10);
    }

    #[test]
    fn profile_checkpoints_returns_body_value() {
        let value = profile_checkpoints("real clock", |probe| {
            probe.mark("start");
            7
        });

        assert_eq!(value, 7);
    }
}
