//! Worklog CLI - composition root for the worklog engine
//!
//! Wires configuration, logging, the SQLite pool, and the core services,
//! then exposes the task lifecycle and workload report as subcommands.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::sync::Arc;
use tabled::{Table, Tabled};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use worklog_core::application::{CreateTaskRequest, TaskLifecycle, WorkloadAggregator};
use worklog_core::domain::Task;
use worklog_core::port::id_provider::UuidProvider;
use worklog_core::port::time_provider::SystemTimeProvider;
use worklog_infra_sqlite::{create_pool, run_migrations, SqliteTaskRepository};

const DEFAULT_DB_PATH: &str = "~/.worklog/worklog.db";

#[derive(Parser)]
#[command(name = "worklog")]
#[command(about = "Track timed tasks and report per-user workload", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// SQLite database path
    #[arg(long, env = "WORKLOG_DB_PATH", default_value = DEFAULT_DB_PATH)]
    db_path: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new pending task
    Create {
        /// Owning user ID
        #[arg(short, long)]
        user_id: i64,

        /// Task name (the aggregation grouping key)
        #[arg(short, long)]
        name: String,
    },

    /// Start timing a task
    Start {
        /// Task ID
        task_id: String,
    },

    /// Stop timing a task and freeze its duration
    Stop {
        /// Task ID
        task_id: String,
    },

    /// Report total time per task name for one user over a date window
    Workload {
        /// User ID
        #[arg(short, long)]
        user_id: i64,

        /// Window start (YYYY-MM-DD, inclusive)
        #[arg(long)]
        from: String,

        /// Window end (YYYY-MM-DD, inclusive)
        #[arg(long)]
        to: String,
    },
}

#[derive(Tabled)]
struct WorkloadRow {
    #[tabled(rename = "Task")]
    task: String,
    #[tabled(rename = "Total")]
    total: String,
}

fn init_logging() {
    let log_format = std::env::var("WORKLOG_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("worklog=info,worklog_core=info,worklog_infra_sqlite=info"))
        .expect("Failed to create env filter");

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }
}

fn print_task(task: &Task) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(task)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let db_path = shellexpand::tilde(&cli.db_path).into_owned();

    if let Some(parent) = std::path::Path::new(&db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }

    info!(db_path = %db_path, "Initializing database...");
    let pool = create_pool(&db_path).await.context("DB pool creation failed")?;
    run_migrations(&pool).await.context("Migration failed")?;

    // DI wiring
    let repo = Arc::new(SqliteTaskRepository::new(pool));
    let lifecycle = TaskLifecycle::new(
        repo.clone(),
        Arc::new(UuidProvider),
        Arc::new(SystemTimeProvider),
    );
    let aggregator = WorkloadAggregator::new(repo);

    match cli.command {
        Commands::Create { user_id, name } => {
            let task = lifecycle
                .create(CreateTaskRequest { user_id, name })
                .await
                .context("create failed")?;
            println!("{} task {}", "created".green(), task.id);
            print_task(&task)?;
        }

        Commands::Start { task_id } => {
            let task = lifecycle.start(&task_id).await.context("start failed")?;
            println!("{} task {}", "started".green(), task.id);
            print_task(&task)?;
        }

        Commands::Stop { task_id } => {
            let task = lifecycle.stop(&task_id).await.context("stop failed")?;
            let duration = task.duration.as_deref().unwrap_or("-");
            println!("{} task {} after {}", "stopped".green(), task.id, duration);
            print_task(&task)?;
        }

        Commands::Workload { user_id, from, to } => {
            let entries = aggregator
                .compute(user_id, &from, &to)
                .await
                .context("workload report failed")?;

            if entries.is_empty() {
                println!(
                    "{} no completed tasks for user {} between {} and {}",
                    "empty".yellow(),
                    user_id,
                    from,
                    to
                );
            } else {
                let rows: Vec<WorkloadRow> = entries
                    .into_iter()
                    .map(|entry| WorkloadRow {
                        task: entry.task_name,
                        total: entry.duration,
                    })
                    .collect();
                println!("{}", Table::new(rows));
            }
        }
    }

    Ok(())
}
