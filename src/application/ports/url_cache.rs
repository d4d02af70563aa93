//! URL Cache Repository Port - 外部流地址短期缓存
//!
//! 每个视频 ID 至多一条记录，写入为 upsert（last-write-wins）

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::VideoId;

/// Repository 错误
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// 外部 URL 缓存记录
#[derive(Debug, Clone, PartialEq)]
pub struct UrlCacheRecord {
    pub video_id: VideoId,
    pub audio_url: String,
    pub expires_at: DateTime<Utc>,
}

impl UrlCacheRecord {
    /// `now > expires_at` 即失效
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// URL Cache Repository Port
#[async_trait]
pub trait UrlCacheRepositoryPort: Send + Sync {
    async fn find(&self, video_id: &VideoId) -> Result<Option<UrlCacheRecord>, RepositoryError>;

    async fn upsert(&self, record: &UrlCacheRecord) -> Result<(), RepositoryError>;
}
