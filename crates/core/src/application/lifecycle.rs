// Task Lifecycle Use Cases
//
// Enforces the pending -> running -> completed state machine. The domain
// transition validates the state tag; the repository then persists it with
// a conditional update, so a concurrent transition on the same task loses
// with `InvalidState` instead of double-writing.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::domain::{Task, TaskId, UserId};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, TaskRepository, TimeProvider};

/// Create request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub user_id: UserId,
    pub name: String,
}

/// Task lifecycle service
pub struct TaskLifecycle {
    repo: Arc<dyn TaskRepository>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
}

impl TaskLifecycle {
    pub fn new(
        repo: Arc<dyn TaskRepository>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            repo,
            id_provider,
            time_provider,
        }
    }

    /// Register a new pending task
    pub async fn create(&self, req: CreateTaskRequest) -> Result<Task> {
        if req.user_id <= 0 {
            return Err(AppError::InvalidArgument(format!(
                "user id must be positive, got {}",
                req.user_id
            )));
        }
        let name = req.name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidArgument(
                "task name must not be empty".to_string(),
            ));
        }

        let task = Task::new(
            self.id_provider.generate_id(),
            req.user_id,
            name,
            self.time_provider.now_millis(),
        );
        self.repo.insert(&task).await?;

        info!(task_id = %task.id, user_id = task.user_id, "task created");
        Ok(task)
    }

    /// Start timing a task.
    ///
    /// Retried calls on an already-running or completed task surface
    /// `InvalidState`; callers treat that as "no-op, already in that phase".
    pub async fn start(&self, task_id: &TaskId) -> Result<Task> {
        let mut task = self
            .repo
            .find_by_id(task_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("task {} not found", task_id)))?;

        let now = self.time_provider.now_millis();
        task.start(now)?;
        self.repo.mark_running(task_id, now).await?;

        info!(task_id = %task.id, started_at = now, "task started");
        Ok(task)
    }

    /// Stop timing a task, deriving and freezing the elapsed duration
    pub async fn stop(&self, task_id: &TaskId) -> Result<Task> {
        let mut task = self
            .repo
            .find_by_id(task_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("task {} not found", task_id)))?;

        let now = self.time_provider.now_millis();
        let duration = task.finish(now)?;
        self.repo.mark_completed(task_id, now, &duration).await?;

        info!(task_id = %task.id, duration = %duration, "task completed");
        Ok(task)
    }
}
