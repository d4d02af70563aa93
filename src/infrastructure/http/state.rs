//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use chrono::Duration;
use std::sync::Arc;

use crate::application::{
    // Command handlers
    CleanupAudioHandler,
    // Query handlers
    GetAudioFileHandler, GetAudioHandler, GetCacheStatsHandler, GetDownloadStatusHandler,
    ResolveStreamUrlHandler,
    // Ports
    AudioStorePort, DownloadCoordinatorPort, StreamResolverPort, UrlCacheRepositoryPort,
};
use crate::domain::CachePolicy;

/// 应用状态
///
/// 下载协调器为进程内单例，由调用方创建后注入
pub struct AppState {
    // ========== Command Handlers ==========
    /// 与 CleanupWorker 共享
    pub cleanup_handler: Arc<CleanupAudioHandler>,

    // ========== Query Handlers ==========
    pub get_audio_handler: GetAudioHandler,
    pub get_audio_file_handler: GetAudioFileHandler,
    pub get_download_status_handler: GetDownloadStatusHandler,
    pub get_cache_stats_handler: GetCacheStatsHandler,

    /// `/api/cron/*` 的 Bearer token
    pub cron_secret: Option<String>,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        audio_store: Arc<dyn AudioStorePort>,
        coordinator: Arc<dyn DownloadCoordinatorPort>,
        url_cache: Arc<dyn UrlCacheRepositoryPort>,
        resolver: Arc<dyn StreamResolverPort>,
        policy: CachePolicy,
        url_ttl: Duration,
        cleanup_handler: Arc<CleanupAudioHandler>,
        cron_secret: Option<String>,
    ) -> Self {
        let stream_url = Arc::new(ResolveStreamUrlHandler::new(url_cache, resolver, url_ttl));

        Self {
            // Query handlers
            get_audio_handler: GetAudioHandler::new(
                audio_store.clone(),
                coordinator.clone(),
                stream_url,
                policy.clone(),
            ),
            get_audio_file_handler: GetAudioFileHandler::new(audio_store.clone()),
            get_download_status_handler: GetDownloadStatusHandler::new(coordinator.clone()),
            get_cache_stats_handler: GetCacheStatsHandler::new(audio_store, coordinator, policy),

            // Command handlers
            cleanup_handler,

            cron_secret,
        }
    }
}
