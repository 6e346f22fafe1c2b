//! Ordered, idempotent schema upgrades tracked in a single-row
//! `_schema_version` table.

use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};

pub struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub statements: &'static [&'static str],
}

/// Append-only. Never reorder or edit a shipped migration; add a new
/// one instead.
pub static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "base schema",
        statements: &[
            "CREATE TABLE IF NOT EXISTS meetings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                date TEXT,
                duration REAL,
                platform TEXT,
                url TEXT,
                status TEXT NOT NULL DEFAULT 'processing',
                audio_file TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                extracted_data TEXT
            )",
            "CREATE TABLE IF NOT EXISTS transcripts (
                meeting_id INTEGER NOT NULL UNIQUE REFERENCES meetings(id) ON DELETE CASCADE,
                full_text TEXT NOT NULL,
                formatted TEXT NOT NULL,
                stats TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS segments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                meeting_id INTEGER NOT NULL REFERENCES meetings(id) ON DELETE CASCADE,
                speaker TEXT NOT NULL,
                text TEXT NOT NULL,
                start_time REAL NOT NULL,
                end_time REAL NOT NULL
            )",
            "CREATE INDEX IF NOT EXISTS ix_segments_meeting_start
                ON segments(meeting_id, start_time)",
            "CREATE TABLE IF NOT EXISTS jobs (
                job_id TEXT PRIMARY KEY,
                meeting_id INTEGER NOT NULL REFERENCES meetings(id) ON DELETE CASCADE,
                status TEXT NOT NULL DEFAULT 'queued',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                result TEXT,
                error TEXT
            )",
            "CREATE UNIQUE INDEX IF NOT EXISTS ix_jobs_job_id ON jobs(job_id)",
        ],
    },
];

/// Runs every declared migration whose `version` is greater than the
/// database's current `_schema_version`, each inside its own
/// transaction. A fresh database is seeded to version 0 first, so a new
/// install replays the full list rather than being special-cased to the
/// latest version directly.
pub async fn run(pool: &SqlitePool) -> DbResult<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS _schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    let existing = sqlx::query("SELECT version FROM _schema_version WHERE id = 1")
        .fetch_optional(pool)
        .await?;

    if existing.is_none() {
        sqlx::query("INSERT INTO _schema_version (id, version) VALUES (1, 0)")
            .execute(pool)
            .await?;
    }

    let current: i64 = sqlx::query("SELECT version FROM _schema_version WHERE id = 1")
        .fetch_one(pool)
        .await?
        .get(0);

    for migration in MIGRATIONS.iter().filter(|m| m.version as i64 > current) {
        apply(pool, migration).await?;
    }

    Ok(())
}

async fn apply(pool: &SqlitePool, migration: &Migration) -> DbResult<()> {
    let mut tx = pool.begin().await?;

    for statement in migration.statements {
        if let Err(err) = sqlx::query(statement).execute(&mut *tx).await {
            if err
                .to_string()
                .to_lowercase()
                .contains("duplicate column")
            {
                debug!(version = migration.version, %err, "swallowing already-applied migration statement");
                continue;
            }
            return Err(DbError::Migration {
                version: migration.version,
                source: err,
            });
        }
    }

    sqlx::query("UPDATE _schema_version SET version = ? WHERE id = 1")
        .bind(migration.version as i64)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    info!(version = migration.version, description = migration.description, "applied migration");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn fresh_pool() -> SqlitePool {
        SqlitePool::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn fresh_database_seeds_to_zero_and_replays_all_migrations() {
        let pool = fresh_pool().await;
        run(&pool).await.unwrap();

        let version: i64 = sqlx::query("SELECT version FROM _schema_version WHERE id = 1")
            .fetch_one(&pool)
            .await
            .unwrap()
            .get(0);
        assert_eq!(version, MIGRATIONS.last().unwrap().version as i64);

        let count: i64 = sqlx::query("SELECT COUNT(*) FROM meetings")
            .fetch_one(&pool)
            .await
            .unwrap()
            .get(0);
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn running_twice_is_idempotent() {
        let pool = fresh_pool().await;
        run(&pool).await.unwrap();
        run(&pool).await.unwrap();
    }
}
