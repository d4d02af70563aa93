//! In-Memory Download Coordinator Implementation
//!
//! 进程内 single-flight：DashMap 的 entry 保证同一视频 ID 只插入一个任务，
//! 任务结束（成功、失败或 panic）时由 guard 移除

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

use crate::application::ports::{
    AudioDownloaderPort, AudioStorePort, DownloadCoordinatorPort, DownloadError, DownloadStatus,
    SpawnOutcome,
};
use crate::domain::VideoId;

/// 进行中的下载任务
#[derive(Debug, Clone)]
pub struct DownloadTask {
    pub video_id: VideoId,
    pub started_at: DateTime<Utc>,
}

/// 最近一次失败
#[derive(Debug, Clone)]
struct DownloadFailure {
    error: String,
    failed_at: DateTime<Utc>,
}

struct Inner {
    audio_store: Arc<dyn AudioStorePort>,
    downloader: Arc<dyn AudioDownloaderPort>,
    /// video_id -> 进行中的任务
    tasks: DashMap<VideoId, DownloadTask>,
    /// video_id -> 最近一次失败，下一次尝试时清除
    failures: DashMap<VideoId, DownloadFailure>,
}

/// 任务结束时移除 in-flight 记录
struct InFlightGuard<'a> {
    tasks: &'a DashMap<VideoId, DownloadTask>,
    video_id: &'a VideoId,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.tasks.remove(self.video_id);
    }
}

/// 内存下载协调器
///
/// 每个进程（或每个测试）持有一个实例，通过 Arc 注入给需要的组件
#[derive(Clone)]
pub struct InMemoryDownloadCoordinator {
    inner: Arc<Inner>,
}

impl InMemoryDownloadCoordinator {
    pub fn new(
        audio_store: Arc<dyn AudioStorePort>,
        downloader: Arc<dyn AudioDownloaderPort>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                audio_store,
                downloader,
                tasks: DashMap::new(),
                failures: DashMap::new(),
            }),
        }
    }
}

impl Inner {
    async fn run(self: Arc<Self>, video_id: VideoId) {
        let _guard = InFlightGuard {
            tasks: &self.tasks,
            video_id: &video_id,
        };
        self.failures.remove(&video_id);

        let started = std::time::Instant::now();
        match self.download(&video_id).await {
            Ok(size_bytes) => {
                tracing::info!(
                    video_id = %video_id,
                    size_bytes = size_bytes,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Audio cached"
                );
            }
            Err(e) => {
                // 缓存只是优化，失败不影响播放
                tracing::warn!(video_id = %video_id, error = %e, "Background audio download failed");
                self.failures.insert(
                    video_id.clone(),
                    DownloadFailure {
                        error: e.to_string(),
                        failed_at: Utc::now(),
                    },
                );
            }
        }
    }

    async fn download(&self, video_id: &VideoId) -> Result<u64, DownloadError> {
        // 检查与插入之间可能已有上一个任务发布完成
        if let Some(size) = self.audio_store.file_size(video_id).await {
            return Ok(size);
        }

        let stem = self.audio_store.staging_stem(video_id);
        tracing::debug!(video_id = %video_id, staging = %stem.display(), "Downloading audio");

        let staged = match self.downloader.download(video_id, &stem).await {
            Ok(path) => path,
            Err(e) => {
                self.audio_store.discard_staged(&stem).await;
                return Err(e);
            }
        };

        if staged.parent() != stem.parent() {
            self.audio_store.discard_staged(&stem).await;
            return Err(DownloadError::Failed(format!(
                "downloader wrote outside staging directory: {}",
                staged.display()
            )));
        }

        let published = self.audio_store.publish(video_id, &staged).await;
        self.audio_store.discard_staged(&stem).await;
        published.map_err(|e| DownloadError::StorageError(e.to_string()))
    }
}

#[async_trait]
impl DownloadCoordinatorPort for InMemoryDownloadCoordinator {
    async fn spawn_download(&self, video_id: &VideoId) -> SpawnOutcome {
        if self.inner.audio_store.exists(video_id).await {
            return SpawnOutcome::AlreadyCached;
        }

        // entry 持有分片锁，不能跨 await
        match self.inner.tasks.entry(video_id.clone()) {
            Entry::Occupied(_) => return SpawnOutcome::AlreadyDownloading,
            Entry::Vacant(slot) => {
                slot.insert(DownloadTask {
                    video_id: video_id.clone(),
                    started_at: Utc::now(),
                });
            }
        }

        tracing::info!(video_id = %video_id, "Background audio download started");

        let inner = self.inner.clone();
        let video_id = video_id.clone();
        tokio::spawn(inner.run(video_id));

        SpawnOutcome::Started
    }

    fn is_downloading(&self, video_id: &VideoId) -> bool {
        self.inner.tasks.contains_key(video_id)
    }

    fn in_flight(&self) -> usize {
        self.inner.tasks.len()
    }

    async fn status(&self, video_id: &VideoId) -> DownloadStatus {
        if let Some(task) = self.inner.tasks.get(video_id) {
            return DownloadStatus::Downloading {
                started_at: task.started_at,
            };
        }
        if self.inner.audio_store.exists(video_id).await {
            return DownloadStatus::Ready;
        }
        match self.inner.failures.get(video_id) {
            Some(failure) => DownloadStatus::Failed {
                error: failure.error.clone(),
                failed_at: failure.failed_at,
            },
            None => DownloadStatus::Idle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::future::join_all;
    use std::time::Duration;
    use tempfile::TempDir;

    use crate::application::testing::{video_id, FakeDownloader, TEST_VIDEO_ID};
    use crate::infrastructure::adapters::storage::FileAudioStore;

    async fn setup(
        downloader: FakeDownloader,
    ) -> (TempDir, Arc<FileAudioStore>, Arc<FakeDownloader>, InMemoryDownloadCoordinator) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileAudioStore::new(dir.path(), 1024 * 1024).await.unwrap());
        let downloader = Arc::new(downloader);
        let coordinator = InMemoryDownloadCoordinator::new(store.clone(), downloader.clone());
        (dir, store, downloader, coordinator)
    }

    async fn wait_idle(coordinator: &InMemoryDownloadCoordinator) {
        for _ in 0..500 {
            if coordinator.in_flight() == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("downloads did not finish");
    }

    #[tokio::test]
    async fn test_concurrent_admissions_trigger_one_download() {
        let (_dir, store, downloader, coordinator) =
            setup(FakeDownloader::new(vec![3u8; 256], Duration::from_millis(5))).await;
        let id = video_id(TEST_VIDEO_ID);

        let outcomes = join_all((0..16).map(|_| coordinator.spawn_download(&id))).await;
        let started = outcomes
            .iter()
            .filter(|o| **o == SpawnOutcome::Started)
            .count();
        assert_eq!(started, 1);
        assert!(outcomes
            .iter()
            .all(|o| matches!(o, SpawnOutcome::Started | SpawnOutcome::AlreadyDownloading)));

        // 下载进行中再次请求也不会重复
        assert_eq!(
            coordinator.spawn_download(&id).await,
            SpawnOutcome::AlreadyDownloading
        );

        wait_idle(&coordinator).await;
        assert_eq!(downloader.calls(), 1);
        assert_eq!(downloader.max_active(), 1);
        assert_eq!(store.file_size(&id).await, Some(256));

        // 已缓存：幂等
        assert_eq!(
            coordinator.spawn_download(&id).await,
            SpawnOutcome::AlreadyCached
        );
        assert_eq!(downloader.calls(), 1);
    }

    #[tokio::test]
    async fn test_reader_never_observes_partial_file() {
        let payload = vec![9u8; 320];
        let (_dir, store, _downloader, coordinator) =
            setup(FakeDownloader::new(payload.clone(), Duration::from_millis(3))).await;
        let id = video_id(TEST_VIDEO_ID);

        coordinator.spawn_download(&id).await;
        let mut observed = Vec::new();
        while coordinator.is_downloading(&id) {
            if let Some(size) = store.file_size(&id).await {
                observed.push(size);
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        wait_idle(&coordinator).await;

        assert!(observed.iter().all(|size| *size == payload.len() as u64));
        assert_eq!(store.file_size(&id).await, Some(payload.len() as u64));
    }

    #[tokio::test]
    async fn test_failure_is_recorded_and_retry_allowed() {
        let (_dir, store, downloader, coordinator) = setup(FakeDownloader::failing()).await;
        let id = video_id(TEST_VIDEO_ID);

        assert_eq!(coordinator.spawn_download(&id).await, SpawnOutcome::Started);
        wait_idle(&coordinator).await;

        assert!(matches!(
            coordinator.status(&id).await,
            DownloadStatus::Failed { .. }
        ));
        assert!(!store.exists(&id).await);
        assert_eq!(store.list().await.unwrap().len(), 0);
        assert_eq!(store.staging_entries().await, 0);

        // 失败后允许重试
        assert_eq!(coordinator.spawn_download(&id).await, SpawnOutcome::Started);
        wait_idle(&coordinator).await;
        assert_eq!(downloader.calls(), 2);
    }

    #[tokio::test]
    async fn test_different_ids_download_in_parallel() {
        let (_dir, store, downloader, coordinator) =
            setup(FakeDownloader::new(vec![1u8; 128], Duration::from_millis(5))).await;
        let a = video_id("aaaaaaaaaaa");
        let b = video_id("bbbbbbbbbbb");

        assert_eq!(coordinator.spawn_download(&a).await, SpawnOutcome::Started);
        assert_eq!(coordinator.spawn_download(&b).await, SpawnOutcome::Started);
        assert_eq!(coordinator.in_flight(), 2);
        assert!(matches!(
            coordinator.status(&a).await,
            DownloadStatus::Downloading { .. }
        ));

        wait_idle(&coordinator).await;
        assert_eq!(downloader.calls(), 2);
        assert_eq!(downloader.max_active(), 2);
        assert_eq!(coordinator.status(&a).await, DownloadStatus::Ready);
        assert!(store.exists(&b).await);
        assert_eq!(
            coordinator.status(&video_id("ccccccccccc")).await,
            DownloadStatus::Idle
        );
    }
}
