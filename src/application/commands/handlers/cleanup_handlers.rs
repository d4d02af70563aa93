//! Cleanup Command Handlers
//!
//! 按保留期（可选 LRU 目标）清理缓存文件；单个文件删除失败只记录日志并跳过

use chrono::{Duration, Utc};
use std::sync::Arc;

use crate::application::commands::{CleanupAudioCommand, CleanupAudioResponse};
use crate::application::error::ApplicationError;
use crate::application::ports::AudioStorePort;
use crate::domain::CachePolicy;

/// CleanupAudioCommand Handler - Eviction sweep
pub struct CleanupAudioHandler {
    audio_store: Arc<dyn AudioStorePort>,
    policy: CachePolicy,
    /// staging 残留的最大存活时间（超过即视为中断的下载）
    staging_max_age: Duration,
}

impl CleanupAudioHandler {
    pub fn new(
        audio_store: Arc<dyn AudioStorePort>,
        policy: CachePolicy,
        staging_max_age: Duration,
    ) -> Self {
        Self {
            audio_store,
            policy,
            staging_max_age,
        }
    }

    pub async fn handle(
        &self,
        command: CleanupAudioCommand,
    ) -> Result<CleanupAudioResponse, ApplicationError> {
        let now = command.now.unwrap_or_else(Utc::now);

        let files = self.audio_store.list().await?;
        let usage = self.audio_store.disk_usage().await?;
        let plan = self.policy.plan_eviction(files, &usage, now);

        let mut deleted_files = 0u64;
        let mut freed_bytes = 0u64;

        for file in plan.victims() {
            match self.audio_store.remove(&file.video_id).await {
                Ok(freed) => {
                    deleted_files += 1;
                    freed_bytes += freed;
                    tracing::debug!(
                        video_id = %file.video_id,
                        size_bytes = freed,
                        last_played_at = %file.last_played_at,
                        "Evicted cached audio"
                    );
                }
                Err(e) => {
                    tracing::warn!(video_id = %file.video_id, error = %e, "Failed to evict cached audio, skipping");
                }
            }
        }

        if let Err(e) = self.audio_store.purge_staging(now - self.staging_max_age).await {
            tracing::warn!(error = %e, "Failed to purge staging directory");
        }

        let usage = self.audio_store.disk_usage().await?;

        tracing::info!(
            deleted_files = deleted_files,
            freed_bytes = freed_bytes,
            stale = plan.stale.len(),
            over_quota = plan.over_quota.len(),
            total_files = usage.total_files,
            usage_percent = usage.usage_percent(),
            "Audio cache cleanup completed"
        );

        Ok(CleanupAudioResponse {
            deleted_files,
            freed_bytes,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::DateTime;
    use std::path::{Path, PathBuf};

    use crate::application::ports::{AudioStoreError, SweepResult};
    use crate::application::testing::video_id;
    use crate::domain::{CachedAudioFile, DiskUsage, VideoId};
    use crate::infrastructure::adapters::storage::FileAudioStore;

    fn handler(store: Arc<dyn AudioStorePort>, policy: CachePolicy) -> CleanupAudioHandler {
        CleanupAudioHandler::new(store, policy, Duration::hours(1))
    }

    #[tokio::test]
    async fn test_only_files_past_retention_are_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileAudioStore::new(dir.path(), 1024 * 1024).await.unwrap());
        let old = video_id("oldoldoldol");
        let recent = video_id("recentrecen");

        store.insert_for_test(&old, &[0u8; 300]).await;
        store.insert_for_test(&recent, &[0u8; 200]).await;
        store
            .set_last_played(&old, Utc::now() - Duration::days(31))
            .await
            .unwrap();
        store
            .set_last_played(&recent, Utc::now() - Duration::days(1))
            .await
            .unwrap();

        let result = handler(store.clone(), CachePolicy::default())
            .handle(CleanupAudioCommand::default())
            .await
            .unwrap();

        assert_eq!(result.deleted_files, 1);
        assert_eq!(result.freed_bytes, 300);
        assert_eq!(result.usage.total_files, 1);
        assert_eq!(result.usage.total_size_bytes, 200);
        assert!(!store.exists(&old).await);
        assert!(store.exists(&recent).await);
    }

    #[tokio::test]
    async fn test_trim_target_evicts_lru_beyond_retention_sweep() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileAudioStore::new(dir.path(), 1000).await.unwrap());
        for (raw, days) in [("aaaaaaaaaaa", 3), ("bbbbbbbbbbb", 2), ("ccccccccccc", 1)] {
            let id = video_id(raw);
            store.insert_for_test(&id, &[0u8; 300]).await;
            store
                .set_last_played(&id, Utc::now() - Duration::days(days))
                .await
                .unwrap();
        }

        let policy = CachePolicy::default().with_trim_target(50.0);
        let result = handler(store.clone(), policy)
            .handle(CleanupAudioCommand::default())
            .await
            .unwrap();

        assert_eq!(result.deleted_files, 2);
        assert!(store.exists(&video_id("ccccccccccc")).await);
        assert!((result.usage.usage_percent() - 30.0).abs() < 1e-9);
    }

    /// 删除总是失败的存储，用于验证单文件失败不会中断清理
    struct FlakyStore {
        files: Vec<CachedAudioFile>,
        failing: VideoId,
    }

    #[async_trait]
    impl AudioStorePort for FlakyStore {
        fn audio_path(&self, video_id: &VideoId) -> PathBuf {
            PathBuf::from(format!("/cache/{video_id}.mp3"))
        }
        fn staging_stem(&self, video_id: &VideoId) -> PathBuf {
            PathBuf::from(format!("/cache/.staging/{video_id}"))
        }
        async fn exists(&self, _video_id: &VideoId) -> bool {
            true
        }
        async fn file_size(&self, _video_id: &VideoId) -> Option<u64> {
            Some(10)
        }
        async fn touch(&self, _video_id: &VideoId) -> Result<(), AudioStoreError> {
            Ok(())
        }
        async fn publish(&self, _video_id: &VideoId, _staged: &Path) -> Result<u64, AudioStoreError> {
            Ok(0)
        }
        async fn discard_staged(&self, _staging_stem: &Path) {}
        async fn disk_usage(&self) -> Result<DiskUsage, AudioStoreError> {
            Ok(DiskUsage::new(self.files.len() as u64, 30, 1000))
        }
        async fn list(&self) -> Result<Vec<CachedAudioFile>, AudioStoreError> {
            Ok(self.files.clone())
        }
        async fn remove(&self, video_id: &VideoId) -> Result<u64, AudioStoreError> {
            if *video_id == self.failing {
                Err(AudioStoreError::IoError("permission denied".into()))
            } else {
                Ok(10)
            }
        }
        async fn purge_staging(
            &self,
            _older_than: DateTime<Utc>,
        ) -> Result<SweepResult, AudioStoreError> {
            Err(AudioStoreError::IoError("staging unreadable".into()))
        }
    }

    #[tokio::test]
    async fn test_single_file_failure_is_skipped() {
        let stale = Utc::now() - Duration::days(40);
        let files = ["aaaaaaaaaaa", "bbbbbbbbbbb", "ccccccccccc"]
            .into_iter()
            .map(|raw| CachedAudioFile {
                video_id: video_id(raw),
                file_path: PathBuf::from(format!("/cache/{raw}.mp3")),
                size_bytes: 10,
                created_at: None,
                last_played_at: stale,
            })
            .collect();
        let store = Arc::new(FlakyStore {
            files,
            failing: video_id("bbbbbbbbbbb"),
        });

        let result = handler(store, CachePolicy::default())
            .handle(CleanupAudioCommand::default())
            .await
            .unwrap();

        assert_eq!(result.deleted_files, 2);
        assert_eq!(result.freed_bytes, 20);
    }
}
