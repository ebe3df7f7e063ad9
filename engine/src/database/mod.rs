//! Chart store
//!
//! Charts, alerts and tasks live in one SQLite file as JSON documents:
//! - `schema`: versioned migrations
//! - `models`: chart, alert and task shapes plus their patches
//! - `repository`: document CRUD

pub mod models;
pub mod repository;
pub mod schema;

pub use models::*;
pub use repository::Repository;
pub use schema::initialize_database;

use crate::error::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Connections opened by the engine share a generous busy timeout; the
/// realtime reload and a user write regularly hit the file together.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const POOL_SIZE: u32 = 5;

fn chart_store_options(db_path: &Path) -> std::result::Result<SqliteConnectOptions, sqlx::Error> {
    let url = format!("sqlite://{}?mode=rwc", db_path.display());
    Ok(SqliteConnectOptions::from_str(&url)?
        .create_if_missing(true)
        .busy_timeout(BUSY_TIMEOUT)
        .journal_mode(SqliteJournalMode::Wal))
}

/// Open the chart store at `db_path`, migrating it first.
///
/// The schema is brought up to date on a throwaway one-connection pool.
/// Only once that pool is closed are the shared connections opened, so
/// none of them can hold a statement cache from before the migration.
pub async fn create_pool(db_path: &Path) -> Result<SqlitePool> {
    tracing::info!("Opening chart store at {:?}", db_path);

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let migrator = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(chart_store_options(db_path)?)
        .await?;
    initialize_database(&migrator).await?;
    migrator.close().await;

    let pool = SqlitePoolOptions::new()
        .max_connections(POOL_SIZE)
        .connect_with(chart_store_options(db_path)?)
        .await?;

    tracing::info!("Chart store ready ({} connections)", POOL_SIZE);

    Ok(pool)
}
