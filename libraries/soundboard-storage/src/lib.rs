//! Soundboard Storage
//!
//! `SQLite` persistence for categories and sounds.
//!
//! # Architecture
//!
//! - **Vertical Slicing**: `categories` and `sounds` each own their queries
//! - **Atomic Batches**: every write goes through one transaction
//! - **Change Notification**: a revision counter is bumped after each commit,
//!   and `watch_*` feeds republish query results when it moves
//!
//! # Example
//!
//! ```rust,no_run
//! use soundboard_core::SoundboardStore;
//! use soundboard_storage::{create_pool, run_migrations, LocalStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool("sqlite://soundboard.db").await?;
//! run_migrations(&pool).await?;
//!
//! let store = LocalStore::new(pool);
//! let categories = store.list_categories().await?;
//! # Ok(())
//! # }
//! ```

mod context;
mod error;
mod feeds;

// Vertical slices
pub mod categories;
pub mod sounds;

pub use context::LocalStore;
pub use error::{Result, StorageError};

use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
///
/// This should be called once when the application starts to ensure
/// the database schema is up to date.
pub async fn run_migrations(pool: &SqlitePool) -> std::result::Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}

/// Create a new `SQLite` pool
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (e.g., `<sqlite://soundboard.db>`)
pub async fn create_pool(database_url: &str) -> std::result::Result<SqlitePool, sqlx::Error> {
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use std::str::FromStr;

    tracing::debug!(database_url, "Creating SQLite pool");

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    tracing::info!(database_url, "SQLite pool ready");

    Ok(pool)
}
