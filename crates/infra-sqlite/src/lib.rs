// Worklog Infrastructure - SQLite Adapter
// Implements: TaskRepository

mod connection;
mod migration;
mod task_repository;

pub use connection::create_pool;
pub use migration::run_migrations;
pub use task_repository::SqliteTaskRepository;

// Note: sqlx::Error conversion is handled by a helper function here
// (orphan rules: cannot implement From<sqlx::Error> for AppError in core)
