//! Download Coordinator Port - 后台下载 single-flight
//!
//! 同一视频 ID 任意时刻至多一个进行中的下载

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::VideoId;

/// 下载状态
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum DownloadStatus {
    /// 无下载、无本地文件
    Idle,
    /// 下载中
    Downloading { started_at: DateTime<Utc> },
    /// 本地文件已就绪
    Ready,
    /// 最近一次下载失败（下一次请求可重试）
    Failed { error: String, failed_at: DateTime<Utc> },
}

/// spawn 结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnOutcome {
    /// 已启动新的后台下载
    Started,
    /// 已有同 ID 的下载在进行，未重复启动
    AlreadyDownloading,
    /// 本地已缓存，无需下载
    AlreadyCached,
}

/// Download Coordinator Port
///
/// 后台下载对调用者是 fire-and-forget：错误只记录日志，不返回给播放请求
#[async_trait]
pub trait DownloadCoordinatorPort: Send + Sync {
    /// 尝试启动后台下载
    async fn spawn_download(&self, video_id: &VideoId) -> SpawnOutcome;

    /// 是否有进行中的下载
    fn is_downloading(&self, video_id: &VideoId) -> bool;

    /// 进行中的下载数量
    fn in_flight(&self) -> usize;

    /// 查询下载状态
    async fn status(&self, video_id: &VideoId) -> DownloadStatus;
}
