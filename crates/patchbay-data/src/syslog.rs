//! Syslog server records and the ingest log.

use chrono::{DateTime, Utc};
use sqlx::{Executor, FromRow, Postgres};
use uuid::Uuid;

use crate::error::{Result, map_query_err};

/// Raw projection of the `syslog_servers` table.
#[derive(Debug, Clone, FromRow)]
pub struct SyslogServerRow {
    /// Primary key.
    pub id: Uuid,
    /// Address the UDP listener binds.
    pub bind_addr: String,
    /// Port the UDP listener binds.
    pub port: i32,
    /// Whether this record should be activated at startup.
    pub active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Raw projection of the `syslog_messages` table.
#[derive(Debug, Clone, FromRow)]
pub struct SyslogMessageRow {
    /// Primary key.
    pub id: Uuid,
    /// Peer address the datagram arrived from.
    pub source: String,
    /// Syslog facility decoded from the priority prefix.
    pub facility: Option<i16>,
    /// Syslog severity decoded from the priority prefix.
    pub severity: Option<i16>,
    /// Message body.
    pub content: String,
    /// Ingest timestamp.
    pub received_at: DateTime<Utc>,
}

/// Insert payload for an ingested syslog message.
#[derive(Debug, Clone, Copy)]
pub struct NewSyslogMessage<'a> {
    /// Peer address the datagram arrived from.
    pub source: &'a str,
    /// Syslog facility decoded from the priority prefix.
    pub facility: Option<i16>,
    /// Syslog severity decoded from the priority prefix.
    pub severity: Option<i16>,
    /// Message body.
    pub content: &'a str,
}

/// Load the active syslog server record, if one is configured.
///
/// At most one record is honored; the earliest-created active row wins.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn fetch_active_syslog_server<'e, E>(executor: E) -> Result<Option<SyslogServerRow>>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, SyslogServerRow>(
        "SELECT id, bind_addr, port, active, created_at
         FROM syslog_servers
         WHERE active
         ORDER BY created_at, id
         LIMIT 1",
    )
    .fetch_optional(executor)
    .await
    .map_err(map_query_err("fetch active syslog server"))
}

/// Insert a syslog server record and return the stored row.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub async fn insert_syslog_server<'e, E>(
    executor: E,
    bind_addr: &str,
    port: i32,
) -> Result<SyslogServerRow>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, SyslogServerRow>(
        "INSERT INTO syslog_servers (id, bind_addr, port)
         VALUES ($1, $2, $3)
         RETURNING id, bind_addr, port, active, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(bind_addr)
    .bind(port)
    .fetch_one(executor)
    .await
    .map_err(map_query_err("insert syslog server"))
}

/// Append an ingested message to the syslog log.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub async fn insert_syslog_message<'e, E>(executor: E, message: &NewSyslogMessage<'_>) -> Result<()>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        "INSERT INTO syslog_messages (id, source, facility, severity, content)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(Uuid::new_v4())
    .bind(message.source)
    .bind(message.facility)
    .bind(message.severity)
    .bind(message.content)
    .execute(executor)
    .await
    .map_err(map_query_err("insert syslog message"))?;
    Ok(())
}

/// List ingested messages, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn list_syslog_messages<'e, E>(executor: E) -> Result<Vec<SyslogMessageRow>>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, SyslogMessageRow>(
        "SELECT id, source, facility, severity, content, received_at
         FROM syslog_messages
         ORDER BY received_at, id",
    )
    .fetch_all(executor)
    .await
    .map_err(map_query_err("list syslog messages"))
}

/// Count ingested syslog messages.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn count_syslog_messages<'e, E>(executor: E) -> Result<i64>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM syslog_messages")
        .fetch_one(executor)
        .await
        .map_err(map_query_err("count syslog messages"))
}
