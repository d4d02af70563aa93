//! Audio Context - Entities

use chrono::{DateTime, Utc};
use std::path::PathBuf;

use super::VideoId;

/// 本地缓存的音频文件
///
/// 只由 Local File Store 写入；发布后内容不再修改，只会被整体替换或删除
#[derive(Debug, Clone)]
pub struct CachedAudioFile {
    pub video_id: VideoId,
    pub file_path: PathBuf,
    pub size_bytes: u64,
    /// 文件系统不支持 birth time 时为 None
    pub created_at: Option<DateTime<Utc>>,
    /// 最近播放时间，淘汰的唯一依据
    pub last_played_at: DateTime<Utc>,
}
