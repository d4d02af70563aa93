//! SQLite URL Cache Repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::DbPool;
use crate::application::ports::{RepositoryError, UrlCacheRecord, UrlCacheRepositoryPort};
use crate::domain::VideoId;

/// SQLite URL Cache Repository
pub struct SqliteUrlCacheRepository {
    pool: DbPool,
}

impl SqliteUrlCacheRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct UrlCacheRow {
    video_id: String,
    audio_url: String,
    expires_at: String,
}

impl TryFrom<UrlCacheRow> for UrlCacheRecord {
    type Error = RepositoryError;

    fn try_from(row: UrlCacheRow) -> Result<Self, Self::Error> {
        Ok(UrlCacheRecord {
            video_id: VideoId::parse(&row.video_id)
                .map_err(|e| RepositoryError::SerializationError(e.to_string()))?,
            audio_url: row.audio_url,
            expires_at: DateTime::parse_from_rfc3339(&row.expires_at)
                .map_err(|e| RepositoryError::SerializationError(e.to_string()))?
                .with_timezone(&Utc),
        })
    }
}

#[async_trait]
impl UrlCacheRepositoryPort for SqliteUrlCacheRepository {
    async fn find(&self, video_id: &VideoId) -> Result<Option<UrlCacheRecord>, RepositoryError> {
        let row: Option<UrlCacheRow> = sqlx::query_as(
            "SELECT video_id, audio_url, expires_at FROM audio_url_cache WHERE video_id = ?",
        )
        .bind(video_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        row.map(UrlCacheRecord::try_from).transpose()
    }

    async fn upsert(&self, record: &UrlCacheRecord) -> Result<(), RepositoryError> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO audio_url_cache (video_id, audio_url, expires_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(video_id) DO UPDATE SET
                audio_url = excluded.audio_url,
                expires_at = excluded.expires_at,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(record.video_id.as_str())
        .bind(&record.audio_url)
        .bind(record.expires_at.to_rfc3339())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(())
    }
}
