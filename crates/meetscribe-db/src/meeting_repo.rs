//! CRUD and cascade-delete operations over `meetings`, `transcripts` and
//! `segments`.

use chrono::{DateTime, Utc};
use meetscribe_types::{Meeting, MeetingStatus, Segment, Transcript};
use sqlx::{Row, SqlitePool};

use crate::error::{DbError, DbResult};

#[derive(Clone)]
pub struct MeetingRepository {
    pool: SqlitePool,
}

impl MeetingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_meeting(
        &self,
        title: &str,
        date: Option<DateTime<Utc>>,
        duration: Option<f64>,
        platform: Option<&str>,
        url: Option<&str>,
    ) -> DbResult<i64> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "INSERT INTO meetings (title, date, duration, platform, url, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, 'processing', ?, ?)",
        )
        .bind(title)
        .bind(date.map(|d| d.to_rfc3339()))
        .bind(duration)
        .bind(platform)
        .bind(url)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn set_audio_file(&self, meeting_id: i64, audio_file: &str) -> DbResult<()> {
        sqlx::query("UPDATE meetings SET audio_file = ?, updated_at = ? WHERE id = ?")
            .bind(audio_file)
            .bind(Utc::now().to_rfc3339())
            .bind(meeting_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Sets the meeting's terminal status. `extracted_data` is left
    /// untouched here — it is written separately once post-extraction
    /// finishes (or never, if post-extraction fails; that failure never
    /// reopens the meeting's own status).
    pub async fn update_status(&self, meeting_id: i64, status: MeetingStatus) -> DbResult<()> {
        sqlx::query("UPDATE meetings SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(Utc::now().to_rfc3339())
            .bind(meeting_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_extracted_data(
        &self,
        meeting_id: i64,
        extracted_data: serde_json::Value,
    ) -> DbResult<()> {
        sqlx::query("UPDATE meetings SET extracted_data = ?, updated_at = ? WHERE id = ?")
            .bind(extracted_data.to_string())
            .bind(Utc::now().to_rfc3339())
            .bind(meeting_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get_meeting(&self, meeting_id: i64) -> DbResult<Option<Meeting>> {
        let row = sqlx::query(
            "SELECT id, title, date, duration, platform, url, status, audio_file,
                    created_at, updated_at, extracted_data
             FROM meetings WHERE id = ?",
        )
        .bind(meeting_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(row_to_meeting))
    }

    /// Cascades to the meeting's transcript and segments via the
    /// `ON DELETE CASCADE` foreign keys declared in the schema.
    pub async fn delete_meeting(&self, meeting_id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM meetings WHERE id = ?")
            .bind(meeting_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::MeetingNotFound(meeting_id));
        }
        Ok(())
    }

    /// Replaces the meeting's transcript and segments atomically: all
    /// existing segments are removed and the new set inserted in the
    /// same transaction as the transcript upsert, so a reader never
    /// observes a mix of old and new segments.
    pub async fn save_transcript(
        &self,
        meeting_id: i64,
        full_text: &str,
        formatted: &str,
        stats: &serde_json::Value,
        segments: &[(String, String, f64, f64)],
    ) -> DbResult<()> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO transcripts (meeting_id, full_text, formatted, stats, created_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(meeting_id) DO UPDATE SET
                full_text = excluded.full_text,
                formatted = excluded.formatted,
                stats = excluded.stats,
                created_at = excluded.created_at",
        )
        .bind(meeting_id)
        .bind(full_text)
        .bind(formatted)
        .bind(stats.to_string())
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM segments WHERE meeting_id = ?")
            .bind(meeting_id)
            .execute(&mut *tx)
            .await?;

        for (speaker, text, start, end) in segments {
            sqlx::query(
                "INSERT INTO segments (meeting_id, speaker, text, start_time, end_time)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(meeting_id)
            .bind(speaker)
            .bind(text)
            .bind(start)
            .bind(end)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn get_transcript(&self, meeting_id: i64) -> DbResult<Option<Transcript>> {
        let row = sqlx::query(
            "SELECT meeting_id, full_text, formatted, stats, created_at
             FROM transcripts WHERE meeting_id = ?",
        )
        .bind(meeting_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(row_to_transcript))
    }

    pub async fn list_segments(&self, meeting_id: i64) -> DbResult<Vec<Segment>> {
        let rows = sqlx::query(
            "SELECT id, meeting_id, speaker, text, start_time, end_time
             FROM segments WHERE meeting_id = ? ORDER BY start_time ASC",
        )
        .bind(meeting_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(row_to_segment).collect())
    }

    /// Renames every segment in `meeting_id` whose speaker is exactly
    /// `old` to `new`; returns the number of rows changed.
    pub async fn update_speaker(&self, meeting_id: i64, old: &str, new: &str) -> DbResult<u64> {
        let result = sqlx::query(
            "UPDATE segments SET speaker = ? WHERE meeting_id = ? AND speaker = ?",
        )
        .bind(new)
        .bind(meeting_id)
        .bind(old)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn update_title(&self, meeting_id: i64, title: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE meetings SET title = ?, updated_at = ? WHERE id = ?")
            .bind(title)
            .bind(Utc::now().to_rfc3339())
            .bind(meeting_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::MeetingNotFound(meeting_id));
        }
        Ok(())
    }

    pub async fn list_meetings(&self) -> DbResult<Vec<Meeting>> {
        let rows = sqlx::query(
            "SELECT id, title, date, duration, platform, url, status, audio_file,
                    created_at, updated_at, extracted_data
             FROM meetings ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(row_to_meeting).collect())
    }
}

fn row_to_meeting(row: sqlx::sqlite::SqliteRow) -> Meeting {
    let status: String = row.get("status");
    let date: Option<String> = row.get("date");
    let extracted_data: Option<String> = row.get("extracted_data");
    Meeting {
        id: row.get("id"),
        title: row.get("title"),
        date: date.and_then(|d| parse_opt_timestamp(&d)),
        duration: row.get("duration"),
        platform: row.get("platform"),
        url: row.get("url"),
        status: MeetingStatus::parse(&status).unwrap_or(MeetingStatus::Failed),
        audio_file: row.get("audio_file"),
        created_at: parse_timestamp(row.get("created_at")),
        updated_at: parse_timestamp(row.get("updated_at")),
        extracted_data: extracted_data.and_then(|s| serde_json::from_str(&s).ok()),
    }
}

fn row_to_transcript(row: sqlx::sqlite::SqliteRow) -> Transcript {
    let stats: String = row.get("stats");
    Transcript {
        meeting_id: row.get("meeting_id"),
        full_text: row.get("full_text"),
        formatted: row.get("formatted"),
        stats: serde_json::from_str(&stats).unwrap_or(serde_json::Value::Null),
        created_at: parse_timestamp(row.get("created_at")),
    }
}

fn row_to_segment(row: sqlx::sqlite::SqliteRow) -> Segment {
    Segment {
        id: row.get("id"),
        meeting_id: row.get("meeting_id"),
        speaker: row.get("speaker"),
        text: row.get("text"),
        start_time: row.get("start_time"),
        end_time: row.get("end_time"),
    }
}

fn parse_timestamp(raw: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|err| {
            tracing::warn!(%err, raw, "failed to parse stored timestamp, using now()");
            Utc::now()
        })
}

fn parse_opt_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrator;

    async fn repo() -> MeetingRepository {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&pool)
            .await
            .unwrap();
        migrator::run(&pool).await.unwrap();
        MeetingRepository::new(pool)
    }

    #[tokio::test]
    async fn create_then_get_roundtrips() {
        let repo = repo().await;
        let id = repo
            .create_meeting("standup", None, None, Some("zoom"), None)
            .await
            .unwrap();
        let meeting = repo.get_meeting(id).await.unwrap().unwrap();
        assert_eq!(meeting.title, "standup");
        assert_eq!(meeting.status, MeetingStatus::Processing);
    }

    #[tokio::test]
    async fn saving_transcript_twice_replaces_segments() {
        let repo = repo().await;
        let id = repo.create_meeting("m", None, None, None, None).await.unwrap();

        repo.save_transcript(
            id,
            "hello",
            "[00:00:00] A: hello",
            &serde_json::json!({}),
            &[("A".into(), "hello".into(), 0.0, 1.0)],
        )
        .await
        .unwrap();
        assert_eq!(repo.list_segments(id).await.unwrap().len(), 1);

        repo.save_transcript(
            id,
            "hi there",
            "[00:00:00] A: hi\n[00:00:01] B: there",
            &serde_json::json!({}),
            &[
                ("A".into(), "hi".into(), 0.0, 1.0),
                ("B".into(), "there".into(), 1.0, 2.0),
            ],
        )
        .await
        .unwrap();

        let segments = repo.list_segments(id).await.unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "hi");
    }

    #[tokio::test]
    async fn deleting_meeting_cascades_to_segments_and_transcript() {
        let repo = repo().await;
        let id = repo.create_meeting("m", None, None, None, None).await.unwrap();
        repo.save_transcript(
            id,
            "hi",
            "[00:00:00] A: hi",
            &serde_json::json!({}),
            &[("A".into(), "hi".into(), 0.0, 1.0)],
        )
        .await
        .unwrap();

        repo.delete_meeting(id).await.unwrap();

        assert!(repo.get_meeting(id).await.unwrap().is_none());
        assert!(repo.get_transcript(id).await.unwrap().is_none());
        assert!(repo.list_segments(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_title_renames_meeting() {
        let repo = repo().await;
        let id = repo.create_meeting("standup", None, None, None, None).await.unwrap();
        repo.update_title(id, "renamed standup").await.unwrap();
        let meeting = repo.get_meeting(id).await.unwrap().unwrap();
        assert_eq!(meeting.title, "renamed standup");
    }

    #[tokio::test]
    async fn update_title_on_missing_meeting_errors() {
        let repo = repo().await;
        let err = repo.update_title(999, "nope").await.unwrap_err();
        assert!(matches!(err, DbError::MeetingNotFound(999)));
    }

    #[tokio::test]
    async fn list_meetings_returns_newest_first() {
        let repo = repo().await;
        let first = repo.create_meeting("first", None, None, None, None).await.unwrap();
        let second = repo.create_meeting("second", None, None, None, None).await.unwrap();
        let meetings = repo.list_meetings().await.unwrap();
        assert_eq!(meetings.len(), 2);
        let ids: Vec<i64> = meetings.iter().map(|m| m.id).collect();
        assert!(ids.contains(&first) && ids.contains(&second));
    }

    #[tokio::test]
    async fn update_speaker_renames_only_matching_segments() {
        let repo = repo().await;
        let id = repo.create_meeting("m", None, None, None, None).await.unwrap();
        repo.save_transcript(
            id,
            "x",
            "x",
            &serde_json::json!({}),
            &[
                ("SPEAKER_00".into(), "a".into(), 0.0, 1.0),
                ("SPEAKER_00".into(), "b".into(), 1.0, 2.0),
                ("SPEAKER_01".into(), "c".into(), 2.0, 3.0),
            ],
        )
        .await
        .unwrap();

        let changed = repo.update_speaker(id, "SPEAKER_00", "Alice").await.unwrap();
        assert_eq!(changed, 2);

        let segments = repo.list_segments(id).await.unwrap();
        assert_eq!(segments.iter().filter(|s| s.speaker == "Alice").count(), 2);
        assert_eq!(segments.iter().filter(|s| s.speaker == "SPEAKER_01").count(), 1);
    }
}
