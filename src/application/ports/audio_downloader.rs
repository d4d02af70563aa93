//! Audio Downloader Port - 外部下载工具
//!
//! 把外部视频的音频下载到本地 staging 路径

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::VideoId;

/// 下载错误
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Downloader unavailable: {0}")]
    Unavailable(String),

    #[error("Download timed out")]
    Timeout,

    #[error("Download failed: {0}")]
    Failed(String),

    #[error("Downloader produced no file")]
    MissingOutput,

    #[error("Storage error: {0}")]
    StorageError(String),
}

/// Audio Downloader Port
#[async_trait]
pub trait AudioDownloaderPort: Send + Sync {
    /// 下载音频
    ///
    /// `staging_stem` 为不含扩展名的目标前缀，返回实际写入的文件路径
    /// （必须位于 `staging_stem` 所在目录）
    async fn download(
        &self,
        video_id: &VideoId,
        staging_stem: &Path,
    ) -> Result<PathBuf, DownloadError>;
}
