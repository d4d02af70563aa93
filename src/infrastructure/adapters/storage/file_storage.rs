//! File Storage - 文件系统音频缓存实现
//!
//! 实现 AudioStorePort trait
//!
//! 目录结构:
//! - `{base_dir}/{video_id}.mp3`   已发布的缓存文件（平铺）
//! - `{base_dir}/.staging/`        下载中的临时文件，发布时 rename 到规范路径
//!
//! 文件 mtime 即最近播放时间

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use filetime::{set_file_mtime, FileTime};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use uuid::Uuid;

use crate::application::ports::{AudioStoreError, AudioStorePort, SweepResult};
use crate::domain::{CachedAudioFile, DiskUsage, VideoId};

/// 缓存文件扩展名
pub const AUDIO_EXTENSION: &str = "mp3";

/// staging 子目录名
const STAGING_DIR: &str = ".staging";

/// 从文件名解析视频 ID，非缓存文件返回 None
fn video_id_from_file_name(name: &str) -> Option<VideoId> {
    let stem = name.strip_suffix(AUDIO_EXTENSION)?.strip_suffix('.')?;
    VideoId::parse(stem).ok()
}

/// 文件系统音频缓存
pub struct FileAudioStore {
    /// 缓存根目录
    base_dir: PathBuf,
    /// staging 目录（与根目录同一文件系统，保证 rename 原子）
    staging_dir: PathBuf,
    /// 配额（字节）
    quota_bytes: u64,
}

impl FileAudioStore {
    /// 创建新的文件存储
    pub async fn new(base_dir: impl AsRef<Path>, quota_bytes: u64) -> Result<Self, AudioStoreError> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let staging_dir = base_dir.join(STAGING_DIR);

        // 确保目录存在
        fs::create_dir_all(&staging_dir).await?;

        tracing::info!(
            base_dir = %base_dir.display(),
            quota_bytes = quota_bytes,
            "FileAudioStore initialized"
        );

        Ok(Self {
            base_dir,
            staging_dir,
            quota_bytes,
        })
    }

    /// 设置最近播放时间
    pub async fn set_last_played(
        &self,
        video_id: &VideoId,
        at: DateTime<Utc>,
    ) -> Result<(), AudioStoreError> {
        let path = self.audio_path(video_id);
        let mtime = FileTime::from_system_time(SystemTime::from(at));

        tokio::task::spawn_blocking(move || set_file_mtime(&path, mtime))
            .await
            .map_err(|e| AudioStoreError::IoError(e.to_string()))?
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => AudioStoreError::NotFound(video_id.to_string()),
                _ => AudioStoreError::IoError(e.to_string()),
            })
    }

    /// 扫描根目录（不递归）
    ///
    /// 扫描期间消失的文件直接跳过
    async fn scan(&self) -> Result<Vec<CachedAudioFile>, AudioStoreError> {
        let mut files = Vec::new();
        let mut entries = fs::read_dir(&self.base_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let Some(video_id) = entry.file_name().to_str().and_then(video_id_from_file_name)
            else {
                continue;
            };

            let metadata = match entry.metadata().await {
                Ok(m) if m.is_file() => m,
                Ok(_) => continue,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => {
                    tracing::warn!(path = %entry.path().display(), error = %e, "Failed to stat cached audio");
                    continue;
                }
            };

            let last_played_at = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());

            files.push(CachedAudioFile {
                video_id,
                file_path: entry.path(),
                size_bytes: metadata.len(),
                created_at: metadata.created().ok().map(DateTime::<Utc>::from),
                last_played_at,
            });
        }

        Ok(files)
    }
}

#[async_trait]
impl AudioStorePort for FileAudioStore {
    fn audio_path(&self, video_id: &VideoId) -> PathBuf {
        self.base_dir.join(format!("{}.{}", video_id, AUDIO_EXTENSION))
    }

    fn staging_stem(&self, video_id: &VideoId) -> PathBuf {
        self.staging_dir
            .join(format!("{}-{}", video_id, Uuid::new_v4().simple()))
    }

    async fn exists(&self, video_id: &VideoId) -> bool {
        self.file_size(video_id).await.is_some()
    }

    async fn file_size(&self, video_id: &VideoId) -> Option<u64> {
        match fs::metadata(self.audio_path(video_id)).await {
            Ok(metadata) if metadata.is_file() => Some(metadata.len()),
            _ => None,
        }
    }

    async fn touch(&self, video_id: &VideoId) -> Result<(), AudioStoreError> {
        self.set_last_played(video_id, Utc::now()).await
    }

    async fn publish(&self, video_id: &VideoId, staged: &Path) -> Result<u64, AudioStoreError> {
        let size = fs::metadata(staged).await?.len();
        let audio_path = self.audio_path(video_id);

        // 同一文件系统内 rename 原子替换，读者看不到半成品
        fs::rename(staged, &audio_path).await?;

        tracing::debug!(
            video_id = %video_id,
            path = %audio_path.display(),
            size_bytes = size,
            "Published audio file"
        );

        Ok(size)
    }

    async fn discard_staged(&self, staging_stem: &Path) {
        let Some(prefix) = staging_stem.file_name().and_then(|n| n.to_str()) else {
            return;
        };
        let Ok(mut entries) = fs::read_dir(&self.staging_dir).await else {
            return;
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let matches = entry
                .file_name()
                .to_str()
                .map_or(false, |name| name.starts_with(prefix));
            if matches {
                if let Err(e) = fs::remove_file(entry.path()).await {
                    if e.kind() != ErrorKind::NotFound {
                        tracing::warn!(path = %entry.path().display(), error = %e, "Failed to discard staged file");
                    }
                }
            }
        }
    }

    async fn disk_usage(&self) -> Result<DiskUsage, AudioStoreError> {
        let files = self.scan().await?;
        let total_size_bytes = files.iter().map(|f| f.size_bytes).sum();
        Ok(DiskUsage::new(
            files.len() as u64,
            total_size_bytes,
            self.quota_bytes,
        ))
    }

    async fn list(&self) -> Result<Vec<CachedAudioFile>, AudioStoreError> {
        self.scan().await
    }

    async fn remove(&self, video_id: &VideoId) -> Result<u64, AudioStoreError> {
        let audio_path = self.audio_path(video_id);
        let not_found = |e: std::io::Error| match e.kind() {
            ErrorKind::NotFound => AudioStoreError::NotFound(video_id.to_string()),
            _ => AudioStoreError::IoError(e.to_string()),
        };

        let size = fs::metadata(&audio_path).await.map_err(not_found)?.len();
        fs::remove_file(&audio_path).await.map_err(not_found)?;

        tracing::debug!(video_id = %video_id, size_bytes = size, "Deleted audio file");
        Ok(size)
    }

    async fn purge_staging(&self, older_than: DateTime<Utc>) -> Result<SweepResult, AudioStoreError> {
        let mut result = SweepResult::default();
        let mut entries = fs::read_dir(&self.staging_dir).await?;
        let cutoff = SystemTime::from(older_than);

        while let Some(entry) = entries.next_entry().await? {
            let Ok(metadata) = entry.metadata().await else {
                continue;
            };
            let stale = metadata.modified().map_or(false, |m| m < cutoff);
            if !metadata.is_file() || !stale {
                continue;
            }
            match fs::remove_file(entry.path()).await {
                Ok(()) => {
                    result.deleted_files += 1;
                    result.freed_bytes += metadata.len();
                }
                Err(e) => {
                    tracing::warn!(path = %entry.path().display(), error = %e, "Failed to purge staged file");
                }
            }
        }

        if result.deleted_files > 0 {
            tracing::info!(
                deleted_files = result.deleted_files,
                freed_bytes = result.freed_bytes,
                "Purged abandoned staging files"
            );
        }

        Ok(result)
    }
}

#[cfg(test)]
impl FileAudioStore {
    /// 直接写入规范路径（绕过下载流程）
    pub async fn insert_for_test(&self, video_id: &VideoId, data: &[u8]) {
        fs::write(self.audio_path(video_id), data).await.unwrap();
    }

    pub async fn staging_entries(&self) -> usize {
        let mut count = 0;
        let mut entries = fs::read_dir(&self.staging_dir).await.unwrap();
        while let Some(_) = entries.next_entry().await.unwrap() {
            count += 1;
        }
        count
    }
}
