//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping                      GET  健康检查
//! - /api/audio/:video_id           GET  获取播放来源（本地文件或外部流地址）
//! - /api/audio/:video_id/file      GET  本地缓存文件（支持 Range）
//! - /api/audio/:video_id/status    GET  后台下载状态
//! - /api/audio-cache/stats         GET  缓存用量
//! - /api/cron/audio-cleanup        GET  清理缓存（Bearer token）

use axum::{routing::get, Router};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new().nest("/api", api_routes())
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/audio", audio_routes())
        .route("/audio-cache/stats", get(handlers::get_cache_stats))
        .nest("/cron", cron_routes())
}

/// Audio 路由
fn audio_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/:video_id", get(handlers::get_audio))
        .route("/:video_id/file", get(handlers::get_audio_file))
        .route("/:video_id/status", get(handlers::get_download_status))
}

/// Cron 路由
fn cron_routes() -> Router<Arc<AppState>> {
    Router::new().route("/audio-cleanup", get(handlers::audio_cleanup))
}
