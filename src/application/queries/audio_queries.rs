//! Audio Queries - 音频查询

use serde::Serialize;
use std::path::PathBuf;

use crate::application::ports::DownloadStatus;
use crate::domain::{DiskUsage, VideoId};

/// 获取音频播放来源
#[derive(Debug, Clone)]
pub struct GetAudioQuery {
    /// 原始视频 ID（未校验）
    pub video_id: String,
}

/// 播放来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioSource {
    /// 本地文件，立即可播放
    Local,
    /// 外部流地址
    Stream,
}

/// 获取音频播放来源响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetAudioResponse {
    pub source: AudioSource,
    pub url: String,
    /// local: 恒为 true；stream: URL 缓存是否命中
    pub cached: bool,
    /// 是否有后台下载在进行
    pub downloading: bool,
}

/// 解析外部流地址（经过 URL 缓存）
#[derive(Debug, Clone)]
pub struct ResolveStreamUrlQuery {
    pub video_id: VideoId,
}

/// 外部流地址
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStreamUrl {
    pub url: String,
    pub cached: bool,
}

/// 获取本地音频文件
#[derive(Debug, Clone)]
pub struct GetAudioFileQuery {
    pub video_id: String,
}

/// 本地音频文件
#[derive(Debug, Clone)]
pub struct LocalAudioFile {
    pub video_id: VideoId,
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// 查询后台下载状态
#[derive(Debug, Clone)]
pub struct GetDownloadStatusQuery {
    pub video_id: String,
}

/// 下载状态响应
#[derive(Debug, Clone)]
pub struct DownloadStatusResponse {
    pub video_id: VideoId,
    pub status: DownloadStatus,
}

/// 缓存统计查询
#[derive(Debug, Clone, Default)]
pub struct GetCacheStatsQuery;

/// 缓存统计
#[derive(Debug, Clone)]
pub struct CacheStatsResponse {
    pub usage: DiskUsage,
    pub ceiling_percent: f64,
    pub accepting_downloads: bool,
    pub in_flight_downloads: usize,
}
