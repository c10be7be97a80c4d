use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::error::StoreError;

pub async fn connect(database_url: &str) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("connect to database")
}

pub async fn migrate(db: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run migrations")
}

/// Turns unique-index violations into `StoreError::Duplicate` carrying the
/// constraint name; everything else stays a database error.
pub(crate) fn map_write_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            let constraint = db_err.constraint().unwrap_or("unique").to_string();
            return StoreError::Duplicate(constraint);
        }
    }
    StoreError::Database(e)
}
