// End-to-end workload aggregation against the SQLite adapter

use std::sync::Arc;

use chrono::NaiveDate;
use worklog_core::application::WorkloadAggregator;
use worklog_core::domain::Task;
use worklog_core::error::AppError;
use worklog_core::port::TaskRepository;
use worklog_infra_sqlite::{create_pool, run_migrations, SqliteTaskRepository};

async fn setup_repo() -> Arc<SqliteTaskRepository> {
    let pool = create_pool("sqlite::memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();
    Arc::new(SqliteTaskRepository::new(pool))
}

fn ts(date: &str, h: u32, m: u32) -> i64 {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
        .and_utc()
        .timestamp_millis()
}

async fn seed_completed(
    repo: &SqliteTaskRepository,
    user_id: i64,
    name: &str,
    started_at: i64,
    finished_at: i64,
) {
    let mut task = Task::new(
        format!("task-{}-{}-{}", user_id, name, started_at),
        user_id,
        name,
        started_at,
    );
    task.start(started_at).unwrap();
    task.finish(finished_at).unwrap();
    repo.insert(&task).await.unwrap();
}

#[tokio::test]
async fn single_day_report() {
    let repo = setup_repo().await;
    seed_completed(
        &repo,
        7,
        "Coding",
        ts("2024-01-01", 9, 0),
        ts("2024-01-01", 11, 30),
    )
    .await;

    let aggregator = WorkloadAggregator::new(repo);
    let entries = aggregator
        .compute(7, "2024-01-01", "2024-01-01")
        .await
        .unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].task_name, "Coding");
    assert_eq!(entries[0].duration, "2h 30m");
}

#[tokio::test]
async fn groups_merge_and_order_by_total() {
    let repo = setup_repo().await;

    // "Coding": 1h + 45m = 1h 45m
    seed_completed(
        &repo,
        7,
        "Coding",
        ts("2024-01-01", 9, 0),
        ts("2024-01-01", 10, 0),
    )
    .await;
    seed_completed(
        &repo,
        7,
        "Coding",
        ts("2024-01-02", 9, 0),
        ts("2024-01-02", 9, 45),
    )
    .await;
    // "Meetings": 3h 30m, must rank first
    seed_completed(
        &repo,
        7,
        "Meetings",
        ts("2024-01-03", 9, 0),
        ts("2024-01-03", 12, 30),
    )
    .await;

    let aggregator = WorkloadAggregator::new(repo);
    let entries = aggregator
        .compute(7, "2024-01-01", "2024-01-07")
        .await
        .unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].task_name, "Meetings");
    assert_eq!(entries[0].duration, "3h 30m");
    assert_eq!(entries[1].task_name, "Coding");
    assert_eq!(entries[1].duration, "1h 45m");
}

#[tokio::test]
async fn window_boundaries_are_inclusive() {
    let repo = setup_repo().await;

    // Starts at the very beginning and ends at the very end of the window
    seed_completed(
        &repo,
        7,
        "Coding",
        ts("2024-01-01", 0, 0),
        ts("2024-01-02", 23, 59),
    )
    .await;

    let aggregator = WorkloadAggregator::new(repo.clone());
    let entries = aggregator
        .compute(7, "2024-01-01", "2024-01-02")
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);

    // The same interval does not fit a one-day window
    let entries = aggregator
        .compute(7, "2024-01-01", "2024-01-01")
        .await
        .unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn running_tasks_are_excluded() {
    let repo = setup_repo().await;

    let mut running = Task::new("task-running", 7, "Coding", 0);
    running.start(ts("2024-01-01", 9, 0)).unwrap();
    repo.insert(&running).await.unwrap();

    let pending = Task::new("task-pending", 7, "Coding", 0);
    repo.insert(&pending).await.unwrap();

    let aggregator = WorkloadAggregator::new(repo);
    let entries = aggregator
        .compute(7, "2024-01-01", "2024-01-01")
        .await
        .unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn empty_window_returns_empty_not_error() {
    let repo = setup_repo().await;
    let aggregator = WorkloadAggregator::new(repo);

    let entries = aggregator
        .compute(7, "2024-06-01", "2024-06-30")
        .await
        .unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn invalid_dates_are_rejected() {
    let repo = setup_repo().await;
    let aggregator = WorkloadAggregator::new(repo);

    assert!(matches!(
        aggregator.compute(7, "2024-13-01", "2024-01-02").await,
        Err(AppError::InvalidArgument(_))
    ));
    assert!(matches!(
        aggregator.compute(-3, "2024-01-01", "2024-01-02").await,
        Err(AppError::InvalidArgument(_))
    ));
}
