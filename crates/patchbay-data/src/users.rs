//! User account rows and queries.

use chrono::{DateTime, Utc};
use sqlx::{Executor, FromRow, Postgres};
use uuid::Uuid;

use crate::error::{Result, map_query_err};

/// Raw projection of the `users` table.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    /// Primary key.
    pub id: Uuid,
    /// Login name. Not unique: lookups resolve the earliest-created row.
    pub name: String,
    /// Contact email address.
    pub email: Option<String>,
    /// Argon2 hash of the account password.
    pub password_hash: String,
    /// Coarse authorization role.
    pub role: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a user account.
#[derive(Debug, Clone, Copy)]
pub struct NewUser<'a> {
    /// Login name.
    pub name: &'a str,
    /// Contact email address.
    pub email: Option<&'a str>,
    /// Argon2 hash of the account password.
    pub password_hash: &'a str,
    /// Coarse authorization role.
    pub role: &'a str,
}

/// Insert a user account and return the stored row.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub async fn insert_user<'e, E>(executor: E, user: &NewUser<'_>) -> Result<UserRow>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, UserRow>(
        "INSERT INTO users (id, name, email, password_hash, role)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id, name, email, password_hash, role, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(user.name)
    .bind(user.email)
    .bind(user.password_hash)
    .bind(user.role)
    .fetch_one(executor)
    .await
    .map_err(map_query_err("insert user"))
}

/// Load a user by primary key.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn fetch_user_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<UserRow>>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, UserRow>(
        "SELECT id, name, email, password_hash, role, created_at
         FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
    .map_err(map_query_err("fetch user by id"))
}

/// Load a user by login name.
///
/// Names are not unique; the earliest-created match wins so repeated
/// lookups are deterministic.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn fetch_user_by_name<'e, E>(executor: E, name: &str) -> Result<Option<UserRow>>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, UserRow>(
        "SELECT id, name, email, password_hash, role, created_at
         FROM users WHERE name = $1
         ORDER BY created_at, id
         LIMIT 1",
    )
    .bind(name)
    .fetch_optional(executor)
    .await
    .map_err(map_query_err("fetch user by name"))
}

/// List all user accounts, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn list_users<'e, E>(executor: E) -> Result<Vec<UserRow>>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, UserRow>(
        "SELECT id, name, email, password_hash, role, created_at
         FROM users ORDER BY created_at, id",
    )
    .fetch_all(executor)
    .await
    .map_err(map_query_err("list users"))
}
