//! Persistent mapping `job_id -> {status, meeting_id, result, error,
//! timestamps}`, backed by the same pool as the rest of
//! `meetscribe-db`. The frontend process is the sole writer.

use chrono::{DateTime, Duration, Utc};
use meetscribe_types::{FrontendJob, FrontendJobStatus};
use sqlx::{Row, SqlitePool};

use crate::error::{DbError, DbResult};

#[derive(Clone)]
pub struct JobStore {
    pool: SqlitePool,
}

impl JobStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts `{status: queued, created_at: now}`. Fails with
    /// [`DbError::DuplicateJob`] if `job_id` already exists.
    pub async fn create_job(&self, job_id: &str, meeting_id: i64) -> DbResult<()> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "INSERT INTO jobs (job_id, meeting_id, status, created_at, updated_at)
             VALUES (?, ?, 'queued', ?, ?)",
        )
        .bind(job_id)
        .bind(meeting_id)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(DbError::DuplicateJob(job_id.to_owned()))
            }
            Err(other) => Err(other.into()),
        }
    }

    /// No-ops if the job is absent — a background task racing a
    /// deletion must not crash on it.
    pub async fn update_status(
        &self,
        job_id: &str,
        status: FrontendJobStatus,
        result: Option<serde_json::Value>,
        error: Option<&str>,
    ) -> DbResult<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "UPDATE jobs SET status = ?, result = ?, error = ?, updated_at = ?
             WHERE job_id = ?",
        )
        .bind(status.as_str())
        .bind(result.map(|v| v.to_string()))
        .bind(error)
        .bind(&now)
        .bind(job_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_job(&self, job_id: &str) -> DbResult<Option<FrontendJob>> {
        let row = sqlx::query(
            "SELECT job_id, meeting_id, status, created_at, updated_at, result, error
             FROM jobs WHERE job_id = ?",
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(row_to_job))
    }

    /// Deletes terminal jobs with `created_at < now - max_age_hours`;
    /// returns the deleted count. Invoked once at process start.
    pub async fn cleanup_old_jobs(&self, max_age_hours: i64) -> DbResult<u64> {
        let cutoff = (Utc::now() - Duration::hours(max_age_hours)).to_rfc3339();
        let result = sqlx::query(
            "DELETE FROM jobs
             WHERE status IN ('completed', 'failed') AND created_at < ?",
        )
        .bind(&cutoff)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

fn row_to_job(row: sqlx::sqlite::SqliteRow) -> FrontendJob {
    let status_str: String = row.get("status");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");
    let result: Option<String> = row.get("result");

    FrontendJob {
        job_id: row.get("job_id"),
        meeting_id: row.get("meeting_id"),
        status: FrontendJobStatus::parse(&status_str).unwrap_or(FrontendJobStatus::Failed),
        created_at: parse_timestamp(&created_at),
        updated_at: parse_timestamp(&updated_at),
        result: result.and_then(|s| serde_json::from_str(&s).ok()),
        error: row.get("error"),
    }
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|err| {
            tracing::warn!(%err, raw, "failed to parse stored timestamp, using now()");
            Utc::now()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrator;

    async fn store_with_meeting() -> (JobStore, i64) {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        migrator::run(&pool).await.unwrap();
        sqlx::query(
            "INSERT INTO meetings (title, status, created_at, updated_at)
             VALUES ('t', 'processing', '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')",
        )
        .execute(&pool)
        .await
        .unwrap();
        (JobStore::new(pool), 1)
    }

    #[tokio::test]
    async fn create_then_fetch_roundtrips() {
        let (store, meeting_id) = store_with_meeting().await;
        store.create_job("abc", meeting_id).await.unwrap();
        let job = store.get_job("abc").await.unwrap().unwrap();
        assert_eq!(job.status, FrontendJobStatus::Queued);
        assert_eq!(job.meeting_id, meeting_id);
    }

    #[tokio::test]
    async fn duplicate_job_id_is_rejected() {
        let (store, meeting_id) = store_with_meeting().await;
        store.create_job("abc", meeting_id).await.unwrap();
        let err = store.create_job("abc", meeting_id).await.unwrap_err();
        assert!(matches!(err, DbError::DuplicateJob(id) if id == "abc"));
    }

    #[tokio::test]
    async fn update_status_on_missing_job_is_a_noop() {
        let (store, _) = store_with_meeting().await;
        store
            .update_status("does-not-exist", FrontendJobStatus::Completed, None, None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn get_job_returns_none_when_absent() {
        let (store, _) = store_with_meeting().await;
        assert!(store.get_job("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cleanup_respects_age_cutoff() {
        let (store, meeting_id) = store_with_meeting().await;
        store.create_job("old", meeting_id).await.unwrap();
        store
            .update_status("old", FrontendJobStatus::Completed, None, None)
            .await
            .unwrap();
        sqlx::query("UPDATE jobs SET created_at = '2000-01-01T00:00:00Z' WHERE job_id = 'old'")
            .execute(&store.pool)
            .await
            .unwrap();

        store.create_job("recent", meeting_id).await.unwrap();
        store
            .update_status("recent", FrontendJobStatus::Completed, None, None)
            .await
            .unwrap();

        let deleted = store.cleanup_old_jobs(24).await.unwrap();
        assert_eq!(deleted, 1);
        assert!(store.get_job("old").await.unwrap().is_none());
        assert!(store.get_job("recent").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn cleanup_zero_hours_deletes_all_terminal_jobs() {
        let (store, meeting_id) = store_with_meeting().await;
        store.create_job("a", meeting_id).await.unwrap();
        store
            .update_status("a", FrontendJobStatus::Failed, None, Some("boom"))
            .await
            .unwrap();
        let deleted = store.cleanup_old_jobs(0).await.unwrap();
        assert_eq!(deleted, 1);
    }
}
