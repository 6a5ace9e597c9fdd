// SQLite TaskRepository Implementation

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;
use worklog_core::domain::{ReportRange, Task, TaskId, TaskState, UserId};
use worklog_core::error::{AppError, Result};
use worklog_core::port::TaskRepository;

// Helper to convert sqlx::Error to AppError with structured information.
// Every storage failure surfaces as Unavailable; the caller never retries.
fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => {
            if let Some(code) = db_err.code() {
                let code_str = code.as_ref();

                // SQLite error codes: https://www.sqlite.org/rescode.html
                match code_str {
                    "2067" | "1555" => AppError::Unavailable(format!(
                        "unique constraint violation: {} ({})",
                        db_err.message(),
                        code_str
                    )),
                    "5" => AppError::Unavailable(format!(
                        "database locked (SQLITE_BUSY): {}",
                        db_err.message()
                    )),
                    "13" => {
                        AppError::Unavailable(format!("database full: {}", db_err.message()))
                    }
                    _ => AppError::Unavailable(format!(
                        "database error [{}]: {}",
                        code_str,
                        db_err.message()
                    )),
                }
            } else {
                AppError::Unavailable(format!("database error: {}", db_err.message()))
            }
        }
        sqlx::Error::RowNotFound => AppError::Unavailable("row not found".to_string()),
        sqlx::Error::ColumnNotFound(col) => {
            AppError::Unavailable(format!("column not found: {}", col))
        }
        _ => AppError::Unavailable(err.to_string()),
    }
}

pub struct SqliteTaskRepository {
    pool: SqlitePool,
}

impl SqliteTaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // Distinguishes a lost transition race from a missing row once a
    // conditional update touched nothing.
    async fn classify_failed_transition(&self, id: &TaskId, to: TaskState) -> AppError {
        let current: Option<String> = match sqlx::query_scalar("SELECT state FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
        {
            Ok(row) => row,
            Err(err) => return map_sqlx_error(err),
        };

        match current {
            None => AppError::NotFound(format!("task {} not found", id)),
            Some(state) => AppError::InvalidState(format!(
                "cannot move task {} from {} to {}",
                id, state, to
            )),
        }
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn insert(&self, task: &Task) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tasks (
                id, user_id, name, state,
                created_at, started_at, finished_at, duration
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&task.id)
        .bind(task.user_id)
        .bind(&task.name)
        .bind(task.state.to_string())
        .bind(task.created_at)
        .bind(task.started_at)
        .bind(task.finished_at)
        .bind(&task.duration)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn find_by_id(&self, id: &TaskId) -> Result<Option<Task>> {
        let row = sqlx::query_as::<_, TaskRow>("SELECT * FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(|r| r.into_task()))
    }

    async fn mark_running(&self, id: &TaskId, started_at: i64) -> Result<()> {
        // Conditional update: the state guard makes concurrent starts on the
        // same pending task resolve to exactly one winner.
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET state = ?, started_at = ?
            WHERE id = ? AND state = ?
            "#,
        )
        .bind(TaskState::Running.to_string())
        .bind(started_at)
        .bind(id)
        .bind(TaskState::Pending.to_string())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(self.classify_failed_transition(id, TaskState::Running).await);
        }

        debug!(task_id = %id, started_at, "task marked running");
        Ok(())
    }

    async fn mark_completed(&self, id: &TaskId, finished_at: i64, duration: &str) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET state = ?, finished_at = ?, duration = ?
            WHERE id = ? AND state = ?
            "#,
        )
        .bind(TaskState::Completed.to_string())
        .bind(finished_at)
        .bind(duration)
        .bind(id)
        .bind(TaskState::Running.to_string())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(self
                .classify_failed_transition(id, TaskState::Completed)
                .await);
        }

        debug!(task_id = %id, finished_at, duration, "task marked completed");
        Ok(())
    }

    async fn find_completed_in_range(
        &self,
        user_id: UserId,
        range: &ReportRange,
    ) -> Result<Vec<Task>> {
        let rows: Vec<TaskRow> = sqlx::query_as(
            r#"
            SELECT * FROM tasks
            WHERE user_id = ? AND state = ?
              AND started_at >= ? AND finished_at <= ?
            ORDER BY started_at ASC
            "#,
        )
        .bind(user_id)
        .bind(TaskState::Completed.to_string())
        .bind(range.start_ms)
        .bind(range.end_ms)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(|row| row.into_task()).collect())
    }
}

/// SQLite row representation
#[derive(Debug, sqlx::FromRow)]
struct TaskRow {
    id: String,
    user_id: i64,
    name: String,
    state: String,
    created_at: i64,
    started_at: Option<i64>,
    finished_at: Option<i64>,
    duration: Option<String>,
}

impl TaskRow {
    fn into_task(self) -> Task {
        let state = match self.state.as_str() {
            "PENDING" => TaskState::Pending,
            "RUNNING" => TaskState::Running,
            "COMPLETED" => TaskState::Completed,
            _ => TaskState::Pending, // Default fallback
        };

        Task {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            state,
            created_at: self.created_at,
            started_at: self.started_at,
            finished_at: self.finished_at,
            duration: self.duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations};
    use chrono::NaiveDate;

    async fn setup_test_db() -> SqlitePool {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> i64 {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
            .and_utc()
            .timestamp_millis()
    }

    #[tokio::test]
    async fn insert_and_find_round_trip() {
        let repo = SqliteTaskRepository::new(setup_test_db().await);
        let task = Task::new("task-1", 7, "Coding", 1000);

        repo.insert(&task).await.unwrap();
        let stored = repo.find_by_id(&task.id).await.unwrap().unwrap();

        assert_eq!(stored.id, "task-1");
        assert_eq!(stored.user_id, 7);
        assert_eq!(stored.name, "Coding");
        assert_eq!(stored.state, TaskState::Pending);
        assert!(stored.started_at.is_none());

        let missing = repo.find_by_id(&"nope".to_string()).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn mark_running_guards_on_state() {
        let repo = SqliteTaskRepository::new(setup_test_db().await);
        let task = Task::new("task-2", 7, "Coding", 1000);
        repo.insert(&task).await.unwrap();

        repo.mark_running(&task.id, 2000).await.unwrap();
        let stored = repo.find_by_id(&task.id).await.unwrap().unwrap();
        assert_eq!(stored.state, TaskState::Running);
        assert_eq!(stored.started_at, Some(2000));

        // Second start loses the guard and never mutates started_at
        let retry = repo.mark_running(&task.id, 9000).await;
        assert!(matches!(retry, Err(AppError::InvalidState(_))));
        let stored = repo.find_by_id(&task.id).await.unwrap().unwrap();
        assert_eq!(stored.started_at, Some(2000));

        let missing = repo.mark_running(&"nope".to_string(), 2000).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn mark_completed_guards_on_state() {
        let repo = SqliteTaskRepository::new(setup_test_db().await);
        let task = Task::new("task-3", 7, "Coding", 1000);
        repo.insert(&task).await.unwrap();

        // Pending task cannot complete
        let premature = repo.mark_completed(&task.id, 5000, "4s").await;
        assert!(matches!(premature, Err(AppError::InvalidState(_))));

        repo.mark_running(&task.id, 2000).await.unwrap();
        repo.mark_completed(&task.id, 5000, "3s").await.unwrap();

        let stored = repo.find_by_id(&task.id).await.unwrap().unwrap();
        assert_eq!(stored.state, TaskState::Completed);
        assert_eq!(stored.finished_at, Some(5000));
        assert_eq!(stored.duration.as_deref(), Some("3s"));

        // Completing twice is refused and the frozen fields survive
        let retry = repo.mark_completed(&task.id, 9000, "7s").await;
        assert!(matches!(retry, Err(AppError::InvalidState(_))));
        let stored = repo.find_by_id(&task.id).await.unwrap().unwrap();
        assert_eq!(stored.finished_at, Some(5000));
        assert_eq!(stored.duration.as_deref(), Some("3s"));
    }

    #[tokio::test]
    async fn range_query_filters_user_state_and_window() {
        let repo = SqliteTaskRepository::new(setup_test_db().await);

        // Inside the window, completed
        let mut inside = Task::new("task-in", 7, "Coding", 0);
        inside.start(ts(2024, 1, 1, 9, 0)).unwrap();
        inside.finish(ts(2024, 1, 1, 11, 30)).unwrap();
        repo.insert(&inside).await.unwrap();

        // Same window, still running
        let mut running = Task::new("task-run", 7, "Review", 0);
        running.start(ts(2024, 1, 1, 9, 0)).unwrap();
        repo.insert(&running).await.unwrap();

        // Completed but before the window
        let mut early = Task::new("task-early", 7, "Coding", 0);
        early.start(ts(2023, 12, 30, 9, 0)).unwrap();
        early.finish(ts(2023, 12, 30, 10, 0)).unwrap();
        repo.insert(&early).await.unwrap();

        // Completed, in window, different user
        let mut other = Task::new("task-other", 8, "Coding", 0);
        other.start(ts(2024, 1, 1, 9, 0)).unwrap();
        other.finish(ts(2024, 1, 1, 10, 0)).unwrap();
        repo.insert(&other).await.unwrap();

        let range = ReportRange::from_dates(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        );
        let tasks = repo.find_completed_in_range(7, &range).await.unwrap();

        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, "task-in");
        assert_eq!(tasks[0].duration.as_deref(), Some("2h30m0s"));
    }
}
