//! Call timing reports.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::CallRecord;
use crate::timer_state::CallAggregate;

/// Snapshot of the timing data of one profiling session.
///
/// A `Report` groups the recorded time in two views, both sorted by total time descending
/// with ties kept in the order the entries were first recorded:
///
/// * [`categories()`](Self::categories) - time summed per category.
/// * [`calls()`](Self::calls) - time per `(name, category)` pair. A name recorded under two
///   categories appears as two rows.
///
/// Verbose sessions also carry the chronological [`history()`](Self::history) of calls.
///
/// Reports are plain data and can be sent to other threads and merged.
///
/// # Examples
///
/// ```
/// use call_timer::{Session, instrument};
///
/// let query = instrument("db.query", "db", |sql: &str| sql.len());
///
/// let active = Session::builder("report example").verbose(true).build().begin();
/// query.call("SELECT 1");
/// let report = active.finish();
///
/// let (category, _total) = report.categories().first().map(|row| (row.category(), row.total())).unwrap();
/// assert_eq!(category, "db");
/// assert_eq!(report.history().map(<[_]>::len), Some(1));
/// println!("{report}");
/// ```
#[derive(Clone, Debug)]
pub struct Report {
    session_name: String,
    categories: Vec<CategoryRow>,
    calls: Vec<CallRow>,
    history: Option<Vec<CallRecord>>,
}

/// Total time recorded for one category.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CategoryRow {
    category: String,
    total: Duration,
}

/// Total time and call count recorded for one `(name, category)` pair.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CallRow {
    name: String,
    category: String,
    total: Duration,
    calls: u64,
}

impl Report {
    /// Builds a report from aggregates in first-seen order.
    #[must_use]
    pub(crate) fn from_aggregates(
        session_name: &str,
        aggregates: &[CallAggregate],
        history: Option<&[CallRecord]>,
    ) -> Self {
        let mut categories: Vec<CategoryRow> = Vec::new();
        let mut category_positions: HashMap<&str, usize> = HashMap::new();

        for aggregate in aggregates {
            let position = *category_positions
                .entry(aggregate.category.as_str())
                .or_insert_with(|| {
                    categories.push(CategoryRow {
                        category: aggregate.category.clone(),
                        total: Duration::ZERO,
                    });
                    categories.len().saturating_sub(1)
                });

            let row = categories
                .get_mut(position)
                .expect("positions are assigned as rows are pushed");
            row.total = row.total.checked_add(aggregate.total).expect(
                "category time overflows Duration - this indicates an unrealistic scenario",
            );
        }

        let mut calls: Vec<CallRow> = aggregates
            .iter()
            .map(|aggregate| CallRow {
                name: aggregate.name.clone(),
                category: aggregate.category.clone(),
                total: aggregate.total,
                calls: aggregate.calls,
            })
            .collect();

        // Stable sorts, so equal totals keep first-seen order.
        categories.sort_by(|a, b| b.total.cmp(&a.total));
        calls.sort_by(|a, b| b.total.cmp(&a.total));

        Self {
            session_name: session_name.to_string(),
            categories,
            calls,
            history: history.map(<[CallRecord]>::to_vec),
        }
    }

    /// Merges two reports into a new report.
    ///
    /// Calls with the same `(name, category)` are combined as if they had been recorded in a
    /// single session. Histories are concatenated, `a` first. The merged report is named
    /// after both inputs.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::thread;
    ///
    /// use call_timer::{Report, instrument, run_session, with_timer_state};
    ///
    /// fn profile_on_thread() -> Report {
    ///     let work = instrument("work", "cpu", |n: u64| (0..n).sum::<u64>());
    ///     run_session("worker", false, || {
    ///         work.call(1000);
    ///         with_timer_state(|state| state.to_report())
    ///     })
    /// }
    ///
    /// let a = thread::spawn(profile_on_thread).join().unwrap();
    /// let b = thread::spawn(profile_on_thread).join().unwrap();
    ///
    /// let merged = Report::merge(&a, &b);
    /// assert_eq!(merged.calls().first().unwrap().calls(), 2);
    /// ```
    #[must_use]
    pub fn merge(a: &Self, b: &Self) -> Self {
        let mut aggregates: Vec<CallAggregate> = Vec::new();

        for row in a.calls.iter().chain(&b.calls) {
            if let Some(existing) = aggregates
                .iter_mut()
                .find(|existing| existing.name == row.name && existing.category == row.category)
            {
                existing.total = existing.total.checked_add(row.total).expect(
                    "merging call times overflows Duration - this indicates an unrealistic scenario",
                );
                existing.calls = existing.calls.checked_add(row.calls).expect(
                    "merging call counts overflows u64 - this indicates an unrealistic scenario",
                );
            } else {
                aggregates.push(CallAggregate {
                    name: row.name.clone(),
                    category: row.category.clone(),
                    total: row.total,
                    calls: row.calls,
                });
            }
        }

        let history = match (&a.history, &b.history) {
            (None, None) => None,
            (a_history, b_history) => Some(
                a_history
                    .iter()
                    .chain(b_history)
                    .flatten()
                    .cloned()
                    .collect::<Vec<_>>(),
            ),
        };

        Self::from_aggregates(
            &format!("{} + {}", a.session_name, b.session_name),
            &aggregates,
            history.as_deref(),
        )
    }

    /// Name of the session that produced the report.
    #[must_use]
    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    /// Time per category, largest first.
    #[must_use]
    pub fn categories(&self) -> &[CategoryRow] {
        &self.categories
    }

    /// Time per `(name, category)` pair, largest first.
    #[must_use]
    pub fn calls(&self) -> &[CallRow] {
        &self.calls
    }

    /// Individual calls in the order they completed, if the session was verbose.
    #[must_use]
    pub fn history(&self) -> Option<&[CallRecord]> {
        self.history.as_deref()
    }

    /// Sum of the time of all outermost instrumented calls.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.categories
            .iter()
            .map(CategoryRow::total)
            .fold(Duration::ZERO, Duration::saturating_add)
    }

    /// Whether no call was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Prints the report to stdout.
    ///
    /// Prints nothing if no calls were recorded.
    #[cfg_attr(test, mutants::skip)] // Too difficult to test stdout output reliably - manually tested.
    pub fn print_to_stdout(&self) {
        if self.is_empty() {
            return;
        }
        println!("{self}");
    }
}

impl CategoryRow {
    /// The category label.
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Total time of all calls in the category.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.total
    }
}

impl CallRow {
    /// Qualified name of the called function.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Category the calls were recorded under.
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Total time of the calls.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.total
    }

    /// Number of timed calls.
    #[must_use]
    pub fn calls(&self) -> u64 {
        self.calls
    }
}

fn format_seconds(duration: Duration) -> String {
    format!("{:.4}", duration.as_secs_f64())
}

/// Writes a two column table: left-aligned labels, right-aligned times.
fn write_table<'a>(
    f: &mut fmt::Formatter<'_>,
    label_header: &str,
    rows: impl Iterator<Item = (&'a str, Duration)>,
) -> fmt::Result {
    const TIME_HEADER: &str = "TIME";

    let rows: Vec<(&str, String)> = rows
        .map(|(label, total)| (label, format_seconds(total)))
        .collect();

    let label_width = rows
        .iter()
        .map(|(label, _)| label.chars().count())
        .chain([label_header.chars().count()])
        .max()
        .unwrap_or_default();
    let time_width = rows
        .iter()
        .map(|(_, time)| time.len())
        .chain([TIME_HEADER.len()])
        .max()
        .unwrap_or_default();

    writeln!(f, "{label_header:<label_width$}  {TIME_HEADER:>time_width$}")?;
    writeln!(f, "{}  {}", "-".repeat(label_width), "-".repeat(time_width))?;

    for (label, time) in rows {
        writeln!(f, "{label:<label_width$}  {time:>time_width$}")?;
    }

    Ok(())
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Performance stats for {}", self.session_name)?;

        write_table(
            f,
            "CATEGORY",
            self.categories
                .iter()
                .map(|row| (row.category.as_str(), row.total)),
        )?;

        writeln!(f)?;

        write_table(
            f,
            "CALL",
            self.calls.iter().map(|row| (row.name.as_str(), row.total)),
        )?;

        if let Some(history) = &self.history {
            writeln!(f)?;
            writeln!(f, "CALL HISTORY")?;
            for record in history {
                writeln!(f, "    {record}")?;
            }
        }

        Ok(())
    }
}
