use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("job {0} already exists")]
    DuplicateJob(String),

    #[error("meeting {0} not found")]
    MeetingNotFound(i64),

    #[error("migration {version} failed: {source}")]
    Migration {
        version: u32,
        #[source]
        source: sqlx::Error,
    },
}

pub type DbResult<T> = Result<T, DbError>;
