// Task Repository Port (Interface)

use crate::domain::{ReportRange, Task, TaskId, UserId};
use crate::error::Result;
use async_trait::async_trait;

/// Repository interface for Task persistence.
///
/// `mark_running` and `mark_completed` are single-row conditional updates:
/// the storage layer guards on the current state so that two concurrent
/// transitions on the same task resolve to exactly one winner, with the
/// loser surfacing `InvalidState`.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Insert a new task
    async fn insert(&self, task: &Task) -> Result<()>;

    /// Find task by ID
    async fn find_by_id(&self, id: &TaskId) -> Result<Option<Task>>;

    /// Persist the pending -> running transition.
    ///
    /// Fails with `NotFound` if the task does not exist and `InvalidState`
    /// if it is not pending.
    async fn mark_running(&self, id: &TaskId, started_at: i64) -> Result<()>;

    /// Persist the running -> completed transition, freezing the formatted
    /// duration. Fails like `mark_running` for absent or non-running tasks.
    async fn mark_completed(&self, id: &TaskId, finished_at: i64, duration: &str) -> Result<()>;

    /// All completed tasks of one user whose interval lies fully inside the
    /// range, ordered by start time.
    async fn find_completed_in_range(
        &self,
        user_id: UserId,
        range: &ReportRange,
    ) -> Result<Vec<Task>>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::TaskState;
    use crate::error::AppError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::Mutex;

    /// HashMap-backed repository with the same conditional-update semantics
    /// as the SQLite adapter.
    #[derive(Default)]
    pub struct InMemoryTaskRepository {
        tasks: Mutex<HashMap<TaskId, Task>>,
        unavailable: AtomicBool,
        range_queries: AtomicU64,
    }

    impl InMemoryTaskRepository {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make every subsequent call fail with `Unavailable`
        pub fn set_unavailable(&self, unavailable: bool) {
            self.unavailable.store(unavailable, Ordering::SeqCst);
        }

        /// Number of range queries served so far
        pub fn range_queries(&self) -> u64 {
            self.range_queries.load(Ordering::SeqCst)
        }

        fn check_available(&self) -> Result<()> {
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(AppError::Unavailable("in-memory store offline".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl TaskRepository for InMemoryTaskRepository {
        async fn insert(&self, task: &Task) -> Result<()> {
            self.check_available()?;
            self.tasks
                .lock()
                .unwrap()
                .insert(task.id.clone(), task.clone());
            Ok(())
        }

        async fn find_by_id(&self, id: &TaskId) -> Result<Option<Task>> {
            self.check_available()?;
            Ok(self.tasks.lock().unwrap().get(id).cloned())
        }

        async fn mark_running(&self, id: &TaskId, started_at: i64) -> Result<()> {
            self.check_available()?;
            let mut tasks = self.tasks.lock().unwrap();
            match tasks.get_mut(id) {
                None => Err(AppError::NotFound(format!("task {} not found", id))),
                Some(task) if task.state != TaskState::Pending => {
                    Err(AppError::InvalidState(format!(
                        "cannot start task {} in state {}",
                        id, task.state
                    )))
                }
                Some(task) => {
                    task.state = TaskState::Running;
                    task.started_at = Some(started_at);
                    Ok(())
                }
            }
        }

        async fn mark_completed(
            &self,
            id: &TaskId,
            finished_at: i64,
            duration: &str,
        ) -> Result<()> {
            self.check_available()?;
            let mut tasks = self.tasks.lock().unwrap();
            match tasks.get_mut(id) {
                None => Err(AppError::NotFound(format!("task {} not found", id))),
                Some(task) if task.state != TaskState::Running => {
                    Err(AppError::InvalidState(format!(
                        "cannot stop task {} in state {}",
                        id, task.state
                    )))
                }
                Some(task) => {
                    task.state = TaskState::Completed;
                    task.finished_at = Some(finished_at);
                    task.duration = Some(duration.to_string());
                    Ok(())
                }
            }
        }

        async fn find_completed_in_range(
            &self,
            user_id: UserId,
            range: &ReportRange,
        ) -> Result<Vec<Task>> {
            self.range_queries.fetch_add(1, Ordering::SeqCst);
            self.check_available()?;

            let tasks = self.tasks.lock().unwrap();
            let mut eligible: Vec<Task> = tasks
                .values()
                .filter(|task| {
                    task.user_id == user_id
                        && task.state == TaskState::Completed
                        && matches!(
                            (task.started_at, task.finished_at),
                            (Some(s), Some(f)) if range.covers(s, f)
                        )
                })
                .cloned()
                .collect();
            eligible.sort_by_key(|task| task.started_at);
            Ok(eligible)
        }
    }
}
