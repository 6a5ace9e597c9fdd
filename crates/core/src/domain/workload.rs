// Workload Projection

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::domain::duration;
use crate::domain::task::Task;

const DAY_MS: i64 = 86_400_000;
const MS_PER_HOUR: f64 = 3_600_000.0;

/// One row of a workload report: total elapsed time for one task name,
/// formatted for display.
///
/// Ephemeral projection; produced fresh on every aggregation call and never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadEntry {
    pub task_name: String,
    pub duration: String,
}

/// Inclusive report window in epoch milliseconds, UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportRange {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl ReportRange {
    /// Build the window from calendar dates: start of `start` to the last
    /// millisecond of `end`. An inverted range is legal and covers nothing.
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Self {
        let start_ms = start.and_time(NaiveTime::MIN).and_utc().timestamp_millis();
        let end_ms = end.and_time(NaiveTime::MIN).and_utc().timestamp_millis() + DAY_MS - 1;
        Self { start_ms, end_ms }
    }

    /// Whether a completed interval lies fully inside the window
    pub fn covers(&self, started_at: i64, finished_at: i64) -> bool {
        started_at >= self.start_ms && finished_at <= self.end_ms
    }
}

/// Group completed tasks by name and sum elapsed time per group.
///
/// Entries are ordered by descending total, ties broken by name ascending.
/// Tasks without a completed interval contribute nothing.
pub fn summarize(tasks: &[Task]) -> Vec<WorkloadEntry> {
    let mut totals: BTreeMap<&str, i64> = BTreeMap::new();
    for task in tasks {
        if let Some(elapsed) = task.elapsed_ms() {
            *totals.entry(task.name.as_str()).or_insert(0) += elapsed;
        }
    }

    // BTreeMap iteration is name-ascending; the stable sort on the total
    // keeps that as the tie order.
    let mut ranked: Vec<(&str, i64)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    ranked
        .into_iter()
        .map(|(name, total_ms)| WorkloadEntry {
            task_name: name.to_string(),
            duration: duration::format_hour_total(total_ms as f64 / MS_PER_HOUR),
        })
        .collect()
}
