//! Audio Query Handlers
//!
//! `/api/audio/:id` 决策流程:
//! CheckLocal -> 命中: 返回本地文件
//!            -> 未命中: 准入检查 -> 后台下载 -> 解析外部流地址

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{AudioStorePort, DownloadCoordinatorPort, SpawnOutcome};
use crate::application::queries::handlers::ResolveStreamUrlHandler;
use crate::application::queries::{
    AudioSource, CacheStatsResponse, DownloadStatusResponse, GetAudioFileQuery, GetAudioQuery,
    GetAudioResponse, GetCacheStatsQuery, GetDownloadStatusQuery, LocalAudioFile,
    ResolveStreamUrlQuery,
};
use crate::domain::{CachePolicy, VideoId};

/// 本地文件的播放地址
pub fn local_file_url(video_id: &VideoId) -> String {
    format!("/api/audio/{}/file", video_id)
}

/// 后台更新最近播放时间，失败忽略
fn spawn_touch(store: &Arc<dyn AudioStorePort>, video_id: &VideoId) {
    let store = store.clone();
    let video_id = video_id.clone();
    tokio::spawn(async move {
        if let Err(e) = store.touch(&video_id).await {
            tracing::debug!(video_id = %video_id, error = %e, "Failed to touch audio file");
        }
    });
}

// ============================================================================
// GetAudio
// ============================================================================

/// GetAudio Handler - Audio Request Orchestrator
pub struct GetAudioHandler {
    audio_store: Arc<dyn AudioStorePort>,
    coordinator: Arc<dyn DownloadCoordinatorPort>,
    stream_url: Arc<ResolveStreamUrlHandler>,
    policy: CachePolicy,
}

impl GetAudioHandler {
    pub fn new(
        audio_store: Arc<dyn AudioStorePort>,
        coordinator: Arc<dyn DownloadCoordinatorPort>,
        stream_url: Arc<ResolveStreamUrlHandler>,
        policy: CachePolicy,
    ) -> Self {
        Self {
            audio_store,
            coordinator,
            stream_url,
            policy,
        }
    }

    pub async fn handle(&self, query: GetAudioQuery) -> Result<GetAudioResponse, ApplicationError> {
        // 校验必须先于任何文件系统或外部工具访问
        let video_id = VideoId::parse(&query.video_id)?;

        if self.audio_store.exists(&video_id).await {
            spawn_touch(&self.audio_store, &video_id);
            tracing::debug!(video_id = %video_id, "Local audio hit");
            return Ok(GetAudioResponse {
                source: AudioSource::Local,
                url: local_file_url(&video_id),
                cached: true,
                downloading: false,
            });
        }

        let downloading = self.admit_download(&video_id).await;

        let resolved = self
            .stream_url
            .handle(ResolveStreamUrlQuery {
                video_id: video_id.clone(),
            })
            .await?;

        Ok(GetAudioResponse {
            source: AudioSource::Stream,
            url: resolved.url,
            cached: resolved.cached,
            downloading,
        })
    }

    /// 准入检查并启动后台下载，返回是否有下载在进行
    ///
    /// 每次检查基于当前快照，并发请求可能短暂超出上限
    async fn admit_download(&self, video_id: &VideoId) -> bool {
        if self.coordinator.is_downloading(video_id) {
            return true;
        }

        let usage = match self.audio_store.disk_usage().await {
            Ok(usage) => usage,
            Err(e) => {
                tracing::warn!(video_id = %video_id, error = %e, "Disk usage check failed, skipping download");
                return false;
            }
        };

        if !self.policy.admits(&usage) {
            tracing::info!(
                video_id = %video_id,
                usage_percent = usage.usage_percent(),
                ceiling_percent = self.policy.ceiling_percent,
                "Audio cache over ceiling, download not admitted"
            );
            return false;
        }

        match self.coordinator.spawn_download(video_id).await {
            SpawnOutcome::Started | SpawnOutcome::AlreadyDownloading => true,
            SpawnOutcome::AlreadyCached => false,
        }
    }
}

// ============================================================================
// GetAudioFile
// ============================================================================

/// GetAudioFile Handler - 本地文件查找
pub struct GetAudioFileHandler {
    audio_store: Arc<dyn AudioStorePort>,
}

impl GetAudioFileHandler {
    pub fn new(audio_store: Arc<dyn AudioStorePort>) -> Self {
        Self { audio_store }
    }

    pub async fn handle(&self, query: GetAudioFileQuery) -> Result<LocalAudioFile, ApplicationError> {
        let video_id = VideoId::parse(&query.video_id)?;

        let size_bytes = self
            .audio_store
            .file_size(&video_id)
            .await
            .ok_or_else(|| ApplicationError::not_found("Audio file", video_id.as_str()))?;

        spawn_touch(&self.audio_store, &video_id);

        Ok(LocalAudioFile {
            path: self.audio_store.audio_path(&video_id),
            video_id,
            size_bytes,
        })
    }
}

// ============================================================================
// GetDownloadStatus
// ============================================================================

/// GetDownloadStatus Handler
pub struct GetDownloadStatusHandler {
    coordinator: Arc<dyn DownloadCoordinatorPort>,
}

impl GetDownloadStatusHandler {
    pub fn new(coordinator: Arc<dyn DownloadCoordinatorPort>) -> Self {
        Self { coordinator }
    }

    pub async fn handle(
        &self,
        query: GetDownloadStatusQuery,
    ) -> Result<DownloadStatusResponse, ApplicationError> {
        let video_id = VideoId::parse(&query.video_id)?;
        let status = self.coordinator.status(&video_id).await;
        Ok(DownloadStatusResponse { video_id, status })
    }
}

// ============================================================================
// GetCacheStats
// ============================================================================

/// GetCacheStats Handler
pub struct GetCacheStatsHandler {
    audio_store: Arc<dyn AudioStorePort>,
    coordinator: Arc<dyn DownloadCoordinatorPort>,
    policy: CachePolicy,
}

impl GetCacheStatsHandler {
    pub fn new(
        audio_store: Arc<dyn AudioStorePort>,
        coordinator: Arc<dyn DownloadCoordinatorPort>,
        policy: CachePolicy,
    ) -> Self {
        Self {
            audio_store,
            coordinator,
            policy,
        }
    }

    pub async fn handle(
        &self,
        _query: GetCacheStatsQuery,
    ) -> Result<CacheStatsResponse, ApplicationError> {
        let usage = self.audio_store.disk_usage().await?;
        Ok(CacheStatsResponse {
            accepting_downloads: self.policy.admits(&usage),
            ceiling_percent: self.policy.ceiling_percent,
            in_flight_downloads: self.coordinator.in_flight(),
            usage,
        })
    }
}
