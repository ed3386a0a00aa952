//! PostgreSQL pool and schema for the ledger store
//!
//! The pool is sized by `DB_MAX_CONNECTIONS`. Every connection runs in UTC so
//! `created_at` ordering matches across sessions; business dates are resolved
//! separately by the business calendar. The schema (customers, loans,
//! payments with their `NUMERIC(14,2)` money columns and the payment `seq`
//! tie-break) lives in `migrations/` and is applied at start-up.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::config::Config;

/// Tables the ledger store reads and writes
const LEDGER_TABLES: [&str; 3] = ["customers", "loans", "payments"];

/// Database errors raised outside the store
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Failed to connect to ledger database: {0}")]
    ConnectionError(String),

    #[error("Failed to apply ledger schema: {0}")]
    MigrationError(String),

    #[error("Ledger database unhealthy: {0}")]
    HealthCheckError(String),
}

/// Open the pool backing [`crate::store::PgStore`]
pub async fn create_pool(config: &Config, database_url: &str) -> Result<PgPool, DbError> {
    tracing::info!(
        url = %config.database_url_masked(),
        max_connections = config.db_max_connections,
        "Connecting to ledger database"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                sqlx::query("SET TIME ZONE 'UTC'")
                    .execute(&mut *conn)
                    .await?;
                Ok(())
            })
        })
        .connect(database_url)
        .await
        .map_err(|e| DbError::ConnectionError(e.to_string()))?;

    Ok(pool)
}

/// Apply pending ledger migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    let migrator = sqlx::migrate!("./migrations");

    migrator
        .run(pool)
        .await
        .map_err(|e| DbError::MigrationError(e.to_string()))?;

    tracing::info!(
        migrations = migrator.iter().count(),
        "Ledger schema up to date"
    );

    Ok(())
}

/// Reachability plus presence of every ledger table
pub async fn check_health(pool: &PgPool) -> Result<(), DbError> {
    let present: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM information_schema.tables
        WHERE table_schema = current_schema() AND table_name::text = ANY($1)
        "#,
    )
    .bind(&LEDGER_TABLES[..])
    .fetch_one(pool)
    .await
    .map_err(|e| DbError::HealthCheckError(e.to_string()))?;

    if present != LEDGER_TABLES.len() as i64 {
        return Err(DbError::HealthCheckError(format!(
            "expected {} ledger tables, found {}",
            LEDGER_TABLES.len(),
            present
        )));
    }

    Ok(())
}
