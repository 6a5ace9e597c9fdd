// Workload Aggregation Use Case

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::debug;

use crate::domain::workload::{summarize, ReportRange, WorkloadEntry};
use crate::domain::UserId;
use crate::error::{AppError, Result};
use crate::port::TaskRepository;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Workload aggregation service: per-user, per-window totals grouped by
/// task name.
pub struct WorkloadAggregator {
    repo: Arc<dyn TaskRepository>,
}

impl WorkloadAggregator {
    pub fn new(repo: Arc<dyn TaskRepository>) -> Self {
        Self { repo }
    }

    /// Total elapsed time per task name for one user over an inclusive date
    /// window.
    ///
    /// Input is validated before any storage access. An inverted range is
    /// not an error; it selects nothing and yields an empty report. Storage
    /// failures abort the whole computation, never partial results.
    pub async fn compute(
        &self,
        user_id: UserId,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<WorkloadEntry>> {
        if user_id <= 0 {
            return Err(AppError::InvalidArgument(format!(
                "user id must be positive, got {}",
                user_id
            )));
        }
        let start = parse_date("start date", start_date)?;
        let end = parse_date("end date", end_date)?;
        let range = ReportRange::from_dates(start, end);

        let tasks = self.repo.find_completed_in_range(user_id, &range).await?;
        debug!(user_id, task_count = tasks.len(), "aggregating completed tasks");

        Ok(summarize(&tasks))
    }
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| {
        AppError::InvalidArgument(format!(
            "invalid {}: {:?} (expected YYYY-MM-DD)",
            field, value
        ))
    })
}
