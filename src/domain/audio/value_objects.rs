//! Audio Context - Value Objects

use serde::{Serialize, Serializer};
use std::str::FromStr;

use super::AudioError;

/// 视频 ID 固定长度
pub const VIDEO_ID_LEN: usize = 11;

/// 外部视频唯一标识
///
/// 构造时即校验 `^[A-Za-z0-9_-]{11}$`，之后可直接用作文件名和命令行参数
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VideoId(String);

impl VideoId {
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, AudioError> {
        let raw = raw.as_ref();
        if Self::is_valid(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(AudioError::InvalidVideoId(raw.to_string()))
        }
    }

    /// 校验字符串是否为合法视频 ID
    pub fn is_valid(raw: &str) -> bool {
        raw.len() == VIDEO_ID_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for VideoId {
    type Err = AudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for VideoId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// 磁盘用量快照（实时计算，不持久化）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DiskUsage {
    pub total_files: u64,
    pub total_size_bytes: u64,
    pub quota_bytes: u64,
}

impl DiskUsage {
    pub fn new(total_files: u64, total_size_bytes: u64, quota_bytes: u64) -> Self {
        Self {
            total_files,
            total_size_bytes,
            quota_bytes,
        }
    }

    /// 相对配额的使用百分比
    ///
    /// 配额为 0 时视为已满
    pub fn usage_percent(&self) -> f64 {
        if self.quota_bytes == 0 {
            return 100.0;
        }
        self.total_size_bytes as f64 / self.quota_bytes as f64 * 100.0
    }

    pub fn total_size_gb(&self) -> f64 {
        self.total_size_bytes as f64 / (1024.0 * 1024.0 * 1024.0)
    }
}
