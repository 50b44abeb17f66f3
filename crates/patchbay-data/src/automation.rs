//! Automation catalog rows and queries: scripts, workflows, tasks.

use chrono::{DateTime, Utc};
use sqlx::{Executor, FromRow, Postgres};
use uuid::Uuid;

use crate::error::{Result, map_query_err};

/// Raw projection of the `scripts` table.
#[derive(Debug, Clone, FromRow)]
pub struct ScriptRow {
    /// Primary key.
    pub id: Uuid,
    /// Unique script name.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Command payload sent to devices.
    pub content: String,
    /// Whether the script ships with the application.
    pub built_in: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Raw projection of the `workflows` table.
#[derive(Debug, Clone, FromRow)]
pub struct WorkflowRow {
    /// Primary key.
    pub id: Uuid,
    /// Unique workflow name.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Raw projection of the `tasks` table.
#[derive(Debug, Clone, FromRow)]
pub struct TaskRow {
    /// Primary key.
    pub id: Uuid,
    /// Unique task name.
    pub name: String,
    /// Script executed when the task fires.
    pub script_id: Option<Uuid>,
    /// Seconds between runs; zero means one-shot.
    pub frequency_seconds: i64,
    /// Next scheduled run; `NULL` means never.
    pub next_run_at: Option<DateTime<Utc>>,
    /// Most recent completed run.
    pub last_run_at: Option<DateTime<Utc>>,
    /// Whether the scheduler considers the task at all.
    pub enabled: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a script.
#[derive(Debug, Clone, Copy)]
pub struct NewScript<'a> {
    /// Unique script name.
    pub name: &'a str,
    /// Free-form description.
    pub description: Option<&'a str>,
    /// Command payload sent to devices.
    pub content: &'a str,
}

/// Insert payload for a task.
#[derive(Debug, Clone, Copy)]
pub struct NewTask<'a> {
    /// Unique task name.
    pub name: &'a str,
    /// Script executed when the task fires.
    pub script_id: Option<Uuid>,
    /// Seconds between runs; zero means one-shot.
    pub frequency_seconds: i64,
    /// Next scheduled run.
    pub next_run_at: Option<DateTime<Utc>>,
    /// Whether the scheduler considers the task at all.
    pub enabled: bool,
}

/// Insert a script and return the stored row.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub async fn insert_script<'e, E>(executor: E, script: &NewScript<'_>) -> Result<ScriptRow>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, ScriptRow>(
        "INSERT INTO scripts (id, name, description, content)
         VALUES ($1, $2, $3, $4)
         RETURNING id, name, description, content, built_in, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(script.name)
    .bind(script.description)
    .bind(script.content)
    .fetch_one(executor)
    .await
    .map_err(map_query_err("insert script"))
}

/// List all scripts, ordered by name.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn list_scripts<'e, E>(executor: E) -> Result<Vec<ScriptRow>>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, ScriptRow>(
        "SELECT id, name, description, content, built_in, created_at
         FROM scripts ORDER BY name",
    )
    .fetch_all(executor)
    .await
    .map_err(map_query_err("list scripts"))
}

/// Load a script by primary key.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn fetch_script_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<ScriptRow>>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, ScriptRow>(
        "SELECT id, name, description, content, built_in, created_at
         FROM scripts WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
    .map_err(map_query_err("fetch script by id"))
}

/// List all workflows, ordered by name.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn list_workflows<'e, E>(executor: E) -> Result<Vec<WorkflowRow>>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, WorkflowRow>(
        "SELECT id, name, description, created_at FROM workflows ORDER BY name",
    )
    .fetch_all(executor)
    .await
    .map_err(map_query_err("list workflows"))
}

/// Insert a workflow and return the stored row.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub async fn insert_workflow<'e, E>(
    executor: E,
    name: &str,
    description: Option<&str>,
) -> Result<WorkflowRow>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, WorkflowRow>(
        "INSERT INTO workflows (id, name, description)
         VALUES ($1, $2, $3)
         RETURNING id, name, description, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(description)
    .fetch_one(executor)
    .await
    .map_err(map_query_err("insert workflow"))
}

/// Insert a task and return the stored row.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub async fn insert_task<'e, E>(executor: E, task: &NewTask<'_>) -> Result<TaskRow>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, TaskRow>(
        "INSERT INTO tasks (id, name, script_id, frequency_seconds, next_run_at, enabled)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING id, name, script_id, frequency_seconds, next_run_at, last_run_at,
                   enabled, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(task.name)
    .bind(task.script_id)
    .bind(task.frequency_seconds)
    .bind(task.next_run_at)
    .bind(task.enabled)
    .fetch_one(executor)
    .await
    .map_err(map_query_err("insert task"))
}

/// List all tasks, ordered by name.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn list_tasks<'e, E>(executor: E) -> Result<Vec<TaskRow>>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, TaskRow>(
        "SELECT id, name, script_id, frequency_seconds, next_run_at, last_run_at,
                enabled, created_at
         FROM tasks ORDER BY name",
    )
    .fetch_all(executor)
    .await
    .map_err(map_query_err("list tasks"))
}

/// Load the enabled tasks whose next run is due, soonest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn fetch_due_tasks<'e, E>(
    executor: E,
    now: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<TaskRow>>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, TaskRow>(
        "SELECT id, name, script_id, frequency_seconds, next_run_at, last_run_at,
                enabled, created_at
         FROM tasks
         WHERE enabled AND next_run_at IS NOT NULL AND next_run_at <= $1
         ORDER BY next_run_at
         LIMIT $2",
    )
    .bind(now)
    .bind(limit)
    .fetch_all(executor)
    .await
    .map_err(map_query_err("fetch due tasks"))
}

/// Record a completed task run and reschedule (or retire) the task.
///
/// # Errors
///
/// Returns an error if the update fails.
pub async fn mark_task_run<'e, E>(
    executor: E,
    id: Uuid,
    ran_at: DateTime<Utc>,
    next_run_at: Option<DateTime<Utc>>,
) -> Result<()>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query("UPDATE tasks SET last_run_at = $2, next_run_at = $3 WHERE id = $1")
        .bind(id)
        .bind(ran_at)
        .bind(next_run_at)
        .execute(executor)
        .await
        .map_err(map_query_err("mark task run"))?;
    Ok(())
}
