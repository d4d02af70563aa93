//! Cleanup Commands - 音频缓存清理

use chrono::{DateTime, Utc};

use crate::domain::DiskUsage;

/// 执行一次缓存清理
#[derive(Debug, Clone, Default)]
pub struct CleanupAudioCommand {
    /// 清理基准时间，默认当前时间
    pub now: Option<DateTime<Utc>>,
}

/// 清理结果
///
/// 只统计成功删除的文件
#[derive(Debug, Clone)]
pub struct CleanupAudioResponse {
    pub deleted_files: u64,
    pub freed_bytes: u64,
    /// 清理后的用量
    pub usage: DiskUsage,
}

impl CleanupAudioResponse {
    pub fn freed_mb(&self) -> f64 {
        self.freed_bytes as f64 / (1024.0 * 1024.0)
    }
}
