//! Audio Handlers

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::Response,
    Json,
};
use std::sync::Arc;

use crate::application::{
    GetAudioFileQuery, GetAudioQuery, GetCacheStatsQuery, GetDownloadStatusQuery,
};
use crate::infrastructure::http::dto::{AudioResponse, CacheStatsDto, DownloadStatusDto};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::range::{serve_file, ByteRange};
use crate::infrastructure::http::state::AppState;

/// `GET /api/audio/:video_id`
pub async fn get_audio(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
) -> Result<Json<AudioResponse>, ApiError> {
    let result = state
        .get_audio_handler
        .handle(GetAudioQuery { video_id })
        .await?;

    Ok(Json(result.into()))
}

/// `GET /api/audio/:video_id/file`
pub async fn get_audio_file(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let file = state
        .get_audio_file_handler
        .handle(GetAudioFileQuery { video_id })
        .await?;

    let range = ByteRange::from_headers(&headers);
    tracing::debug!(
        video_id = %file.video_id,
        size_bytes = file.size_bytes,
        range = ?range,
        "Serving cached audio"
    );

    serve_file(&file.path, range).await
}

/// `GET /api/audio/:video_id/status`
pub async fn get_download_status(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
) -> Result<Json<DownloadStatusDto>, ApiError> {
    let result = state
        .get_download_status_handler
        .handle(GetDownloadStatusQuery { video_id })
        .await?;

    Ok(Json(result.into()))
}

/// `GET /api/audio-cache/stats`
pub async fn get_cache_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CacheStatsDto>, ApiError> {
    let result = state.get_cache_stats_handler.handle(GetCacheStatsQuery).await?;
    Ok(Json(result.into()))
}
