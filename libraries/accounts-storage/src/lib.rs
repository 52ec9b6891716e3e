//! Accounts Storage
//!
//! `SQLite` persistence for user accounts and authentication tokens.
//!
//! # Architecture
//!
//! - **Vertical Slicing**: `users` and `tokens` each own their queries
//! - **Embedded Migrations**: schema ships inside the binary
//! - **`Database`**: implements `accounts_core::UserStore` over a pool
//!
//! # Example
//!
//! ```rust,no_run
//! use accounts_core::UserStore;
//! use accounts_storage::Database;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::connect("sqlite://accounts.db").await?;
//! let users = db.get_all_users().await?;
//! # Ok(())
//! # }
//! ```

mod database;
mod error;

pub mod tokens;
pub mod users;

pub use database::Database;
pub use error::StorageError;

use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
///
/// This should be called once when the application starts to ensure
/// the database schema is up to date.
///
/// # Errors
///
/// Returns an error if migrations fail to run
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), StorageError> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// Create a new `SQLite` pool
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (e.g., `<sqlite://accounts.db>`)
///
/// # Errors
///
/// Returns an error if the URL is malformed or the connection fails
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, StorageError> {
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use std::str::FromStr;

    tracing::debug!(database_url, "Creating SQLite pool");

    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

    Ok(pool)
}
