//! 测试用端口实现

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

use crate::application::ports::{
    AudioDownloaderPort, DownloadError, RepositoryError, ResolveError, StreamResolverPort,
    UrlCacheRecord, UrlCacheRepositoryPort,
};
use crate::domain::VideoId;

pub const TEST_VIDEO_ID: &str = "dQw4w9WgXcQ";

pub fn video_id(raw: &str) -> VideoId {
    VideoId::parse(raw).unwrap()
}

/// 内存 URL 缓存
#[derive(Default)]
pub struct InMemoryUrlCache {
    records: Mutex<HashMap<VideoId, UrlCacheRecord>>,
}

impl InMemoryUrlCache {
    pub fn insert(&self, record: UrlCacheRecord) {
        self.records
            .lock()
            .unwrap()
            .insert(record.video_id.clone(), record);
    }

    pub fn get(&self, video_id: &VideoId) -> Option<UrlCacheRecord> {
        self.records.lock().unwrap().get(video_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

#[async_trait]
impl UrlCacheRepositoryPort for InMemoryUrlCache {
    async fn find(&self, video_id: &VideoId) -> Result<Option<UrlCacheRecord>, RepositoryError> {
        Ok(self.get(video_id))
    }

    async fn upsert(&self, record: &UrlCacheRecord) -> Result<(), RepositoryError> {
        self.insert(record.clone());
        Ok(())
    }
}

/// 解析器行为
#[derive(Debug, Clone)]
pub enum ResolveBehavior {
    Url(String),
    Timeout,
    Unavailable,
    Empty,
}

/// 记录调用次数的解析器
pub struct FakeResolver {
    behavior: Mutex<ResolveBehavior>,
    calls: AtomicUsize,
}

impl FakeResolver {
    pub fn new(behavior: ResolveBehavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn returning(url: &str) -> Self {
        Self::new(ResolveBehavior::Url(url.to_string()))
    }

    pub fn set_behavior(&self, behavior: ResolveBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StreamResolverPort for FakeResolver {
    async fn resolve(&self, _video_id: &VideoId) -> Result<String, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let behavior = self.behavior.lock().unwrap().clone();
        match behavior {
            ResolveBehavior::Url(url) => Ok(url),
            ResolveBehavior::Timeout => Err(ResolveError::Timeout(30)),
            ResolveBehavior::Unavailable => Err(ResolveError::Unavailable("yt-dlp not found".into())),
            ResolveBehavior::Empty => Err(ResolveError::Empty),
        }
    }
}

/// 分块慢速写入 staging 文件的下载器
///
/// 记录调用次数与最大并发数
pub struct FakeDownloader {
    payload: Vec<u8>,
    chunk_delay: Duration,
    fail: bool,
    calls: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl FakeDownloader {
    pub fn new(payload: Vec<u8>, chunk_delay: Duration) -> Self {
        Self {
            payload,
            chunk_delay,
            fail: false,
            calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(b"partial".to_vec(), Duration::from_millis(5))
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    async fn write_slowly(&self, path: &Path) -> std::io::Result<()> {
        let mut file = tokio::fs::File::create(path).await?;
        for chunk in self.payload.chunks(16) {
            file.write_all(chunk).await?;
            file.flush().await?;
            tokio::time::sleep(self.chunk_delay).await;
        }
        file.sync_all().await
    }
}

#[async_trait]
impl AudioDownloaderPort for FakeDownloader {
    async fn download(
        &self,
        _video_id: &VideoId,
        staging_stem: &Path,
    ) -> Result<PathBuf, DownloadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);

        let output = staging_stem.with_extension("mp3");
        let result = self
            .write_slowly(&output)
            .await
            .map_err(|e| DownloadError::Failed(e.to_string()));

        self.active.fetch_sub(1, Ordering::SeqCst);
        result?;

        if self.fail {
            return Err(DownloadError::Failed("simulated network failure".into()));
        }
        Ok(output)
    }
}
