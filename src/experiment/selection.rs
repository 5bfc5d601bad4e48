//! Run selection policies ("which model is latest?")

use super::LoggedRun;
use std::cmp::Ordering;
use std::fmt;

/// How to pick one run out of a store.
///
/// Only finished runs are candidates.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionPolicy {
    /// Most recently finished run; ties broken by run ID
    MostRecent,
    /// Run with the best value of a metric
    BestMetric {
        /// Metric key, e.g. `rmse`
        key: String,
        /// True when smaller values are better (errors), false for scores
        lower_is_better: bool,
    },
    /// Exactly this run
    RunId(String),
}

impl fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MostRecent => write!(f, "most recent run"),
            Self::BestMetric {
                key,
                lower_is_better,
            } => write!(
                f,
                "best run by {} {key}",
                if *lower_is_better { "lowest" } else { "highest" }
            ),
            Self::RunId(id) => write!(f, "run {id}"),
        }
    }
}

fn recency(a: &LoggedRun, b: &LoggedRun) -> Ordering {
    a.record()
        .ended_at()
        .cmp(&b.record().ended_at())
        .then_with(|| a.record().started_at().cmp(&b.record().started_at()))
        .then_with(|| a.run_id().cmp(b.run_id()))
}

/// Pick a run according to `policy`, or `None` if nothing qualifies.
pub fn select_run<'a, I>(runs: I, policy: &SelectionPolicy) -> Option<&'a LoggedRun>
where
    I: IntoIterator<Item = &'a LoggedRun>,
{
    let mut finished = runs.into_iter().filter(|run| run.record().is_finished());

    match policy {
        SelectionPolicy::MostRecent => finished.max_by(|a, b| recency(a, b)),
        SelectionPolicy::RunId(id) => finished.find(|run| run.run_id() == id),
        SelectionPolicy::BestMetric {
            key,
            lower_is_better,
        } => finished
            .filter_map(|run| {
                run.metric(key)
                    .filter(|v| v.is_finite())
                    .map(|value| (run, value))
            })
            .max_by(|(ra, a), (rb, b)| {
                let by_value = if *lower_is_better {
                    b.total_cmp(a)
                } else {
                    a.total_cmp(b)
                };
                by_value.then_with(|| recency(ra, rb))
            })
            .map(|(run, _)| run),
    }
}
