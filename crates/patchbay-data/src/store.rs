//! Connection pool lifecycle and startup seeding.

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::error::{DataError, Result, map_query_err};
use crate::seed;

/// Database-backed persistence handle shared across the application.
///
/// Cloning is cheap: all clones share one pool. Handlers check connections
/// out of the pool for the duration of a query; the checkout is returned on
/// every exit path, so no session crosses requests.
#[derive(Clone)]
pub struct Store {
    pool: PgPool,
}

impl Store {
    /// Establish the connection pool and apply pending migrations.
    ///
    /// Schema creation is idempotent: the migration ledger records applied
    /// versions, so reconnecting against an up-to-date database is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unreachable or a migration fails.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(8)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await
            .map_err(|source| DataError::Connect { source })?;

        run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    /// Access the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the built-in default scripts and filters.
    ///
    /// Part of the deterministic startup sequence. Inserts are keyed on
    /// unique names and skip existing rows, so repeated or concurrent
    /// invocations never duplicate the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a seeding insert fails.
    pub async fn seed_defaults(&self) -> Result<()> {
        seed::seed_default_scripts(&self.pool).await?;
        seed::seed_default_filters(&self.pool).await?;
        Ok(())
    }
}

/// Cheap connectivity probe used by health checks.
///
/// # Errors
///
/// Returns an error when the database cannot be reached.
pub async fn ping(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(map_query_err("ping"))?;
    Ok(())
}

/// Apply all pending schema migrations.
///
/// # Errors
///
/// Returns an error when migration execution fails.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    let mut migrator = sqlx::migrate!("./migrations");
    migrator.set_ignore_missing(true);
    migrator
        .run(pool)
        .await
        .map_err(|source| DataError::MigrationFailed { source })?;
    Ok(())
}
