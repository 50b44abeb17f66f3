//! Built-in default records created at startup.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Result, map_query_err};

/// Scripts shipped with the application: `(name, description, content)`.
const DEFAULT_SCRIPTS: &[(&str, &str, &str)] = &[
    (
        "show_version",
        "Collect platform and version details",
        "show version",
    ),
    (
        "show_running_config",
        "Snapshot the running configuration",
        "show running-config",
    ),
];

/// Filters shipped with the application: `(name, description)`. Patterns are
/// left `NULL` so the filter matches the whole inventory.
const DEFAULT_FILTERS: &[(&str, &str)] = &[("All devices", "Match every inventory device")];

/// Create the built-in default scripts.
///
/// Keyed on the unique script name: existing rows are skipped, so the
/// operation is idempotent under repetition and concurrency.
///
/// # Errors
///
/// Returns an error if an insert fails.
pub async fn seed_default_scripts(pool: &PgPool) -> Result<()> {
    for (name, description, content) in DEFAULT_SCRIPTS {
        sqlx::query(
            "INSERT INTO scripts (id, name, description, content, built_in)
             VALUES ($1, $2, $3, $4, TRUE)
             ON CONFLICT (name) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .bind(content)
        .execute(pool)
        .await
        .map_err(map_query_err("seed default script"))?;
    }
    Ok(())
}

/// Create the built-in default filters.
///
/// Same idempotence contract as [`seed_default_scripts`].
///
/// # Errors
///
/// Returns an error if an insert fails.
pub async fn seed_default_filters(pool: &PgPool) -> Result<()> {
    for (name, description) in DEFAULT_FILTERS {
        sqlx::query(
            "INSERT INTO filters (id, name, description, built_in)
             VALUES ($1, $2, $3, TRUE)
             ON CONFLICT (name) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .execute(pool)
        .await
        .map_err(map_query_err("seed default filter"))?;
    }
    Ok(())
}
