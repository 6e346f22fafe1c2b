//! Persistence for MeetScribe's frontend: schema migrations, the
//! durable job store, and the meeting/transcript/segment repository.
//! All three share one `sqlx::SqlitePool`; the frontend process is the
//! sole writer.

pub mod error;
pub mod job_store;
pub mod meeting_repo;
pub mod migrator;

pub use error::{DbError, DbResult};
pub use job_store::JobStore;
pub use meeting_repo::MeetingRepository;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

/// Connects to `database_url`, enables foreign keys on every pooled
/// connection (needed for cascade deletes — `foreign_keys` is
/// per-connection state in SQLite, default OFF, so this must be set via
/// connect options rather than a one-off `PRAGMA` against the pool),
/// and runs every pending migration before returning.
pub async fn connect(database_url: &str) -> DbResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .foreign_keys(true)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    migrator::run(&pool).await?;
    Ok(pool)
}
