// Task Domain Model

use serde::{Deserialize, Serialize};

use crate::domain::duration;
use crate::domain::error::{DomainError, Result};

/// Task ID (UUID v4)
pub type TaskId = String;

/// Owning user identifier (positive integer)
pub type UserId = i64;

/// Task lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    Pending,
    Running,
    Completed,
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskState::Pending => write!(f, "PENDING"),
            TaskState::Running => write!(f, "RUNNING"),
            TaskState::Completed => write!(f, "COMPLETED"),
        }
    }
}

/// Task entity: one timed unit of user work.
///
/// Transitions are monotonic (pending -> running -> completed) and are
/// validated against the state tag, never against timestamp presence.
/// `started_at` and `finished_at` are each written exactly once; `duration`
/// is derived and frozen when the task completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub user_id: UserId,
    pub name: String,
    pub state: TaskState,

    pub created_at: i64, // epoch ms
    pub started_at: Option<i64>,
    pub finished_at: Option<i64>,

    /// Frozen elapsed time, e.g. "2h15m0s"
    pub duration: Option<String>,
}

impl Task {
    /// Create a new pending Task
    ///
    /// # Arguments
    ///
    /// * `id` - Unique task ID (injected, not generated)
    /// * `user_id` - Owning user; immutable after creation
    /// * `name` - Free-text label; the aggregation grouping key
    /// * `created_at` - Creation timestamp in epoch ms (injected, not system time)
    pub fn new(
        id: impl Into<String>,
        user_id: UserId,
        name: impl Into<String>,
        created_at: i64,
    ) -> Self {
        Self {
            id: id.into(),
            user_id,
            name: name.into(),
            state: TaskState::Pending,
            created_at,
            started_at: None,
            finished_at: None,
            duration: None,
        }
    }

    /// Transition to Running with an explicit timestamp
    pub fn start(&mut self, now_millis: i64) -> Result<()> {
        if self.state != TaskState::Pending {
            return Err(DomainError::InvalidStateTransition {
                from: self.state.to_string(),
                to: TaskState::Running.to_string(),
            });
        }
        self.state = TaskState::Running;
        self.started_at = Some(now_millis);
        Ok(())
    }

    /// Transition to Completed with an explicit timestamp.
    ///
    /// Derives and freezes the elapsed duration; the formatted string is
    /// returned so callers can persist it alongside the state change.
    pub fn finish(&mut self, now_millis: i64) -> Result<String> {
        if self.state != TaskState::Running {
            return Err(DomainError::InvalidStateTransition {
                from: self.state.to_string(),
                to: TaskState::Completed.to_string(),
            });
        }
        let started = self.started_at.ok_or_else(|| {
            DomainError::ValidationError("running task has no start time".to_string())
        })?;

        let formatted = duration::format_elapsed(now_millis - started);
        self.state = TaskState::Completed;
        self.finished_at = Some(now_millis);
        self.duration = Some(formatted.clone());
        Ok(formatted)
    }

    /// Elapsed milliseconds for a completed task
    pub fn elapsed_ms(&self) -> Option<i64> {
        match (self.state, self.started_at, self.finished_at) {
            (TaskState::Completed, Some(started), Some(finished)) => Some(finished - started),
            _ => None,
        }
    }
}
