//! Audio Store Port - 本地音频文件存储
//!
//! 定义本地缓存目录的抽象接口，具体实现在 infrastructure/adapters/storage

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::{CachedAudioFile, DiskUsage, VideoId};

/// 音频存储错误
#[derive(Debug, Error)]
pub enum AudioStoreError {
    #[error("Audio file not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for AudioStoreError {
    fn from(err: std::io::Error) -> Self {
        AudioStoreError::IoError(err.to_string())
    }
}

/// 一次清理的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepResult {
    /// 成功删除的文件数
    pub deleted_files: u64,
    /// 成功释放的字节数
    pub freed_bytes: u64,
}

/// Audio Store Port
///
/// 缓存根目录下每个视频 ID 对应一个文件；只有本存储会写入这些路径
#[async_trait]
pub trait AudioStorePort: Send + Sync {
    /// 视频 ID 对应的规范路径
    fn audio_path(&self, video_id: &VideoId) -> PathBuf;

    /// 为一次下载分配 staging 路径前缀（不含扩展名，与缓存根目录同一文件系统）
    fn staging_stem(&self, video_id: &VideoId) -> PathBuf;

    /// 本地文件是否存在
    async fn exists(&self, video_id: &VideoId) -> bool;

    /// 本地文件大小，不存在时返回 None
    async fn file_size(&self, video_id: &VideoId) -> Option<u64>;

    /// 更新最近播放时间
    async fn touch(&self, video_id: &VideoId) -> Result<(), AudioStoreError>;

    /// 将 staging 文件原子地发布到规范路径，返回文件大小
    async fn publish(&self, video_id: &VideoId, staged: &Path) -> Result<u64, AudioStoreError>;

    /// 删除某次下载在 staging 前缀下留下的所有文件，不存在时忽略
    async fn discard_staged(&self, staging_stem: &Path);

    /// 扫描缓存目录，计算用量
    async fn disk_usage(&self) -> Result<DiskUsage, AudioStoreError>;

    /// 列出所有缓存文件
    async fn list(&self) -> Result<Vec<CachedAudioFile>, AudioStoreError>;

    /// 删除一个缓存文件，返回释放的字节数
    async fn remove(&self, video_id: &VideoId) -> Result<u64, AudioStoreError>;

    /// 清理早于 `older_than` 的 staging 残留
    async fn purge_staging(&self, older_than: DateTime<Utc>) -> Result<SweepResult, AudioStoreError>;
}
