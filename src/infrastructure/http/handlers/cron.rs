//! Cron Handlers
//!
//! 由外部调度器调用，`Authorization: Bearer <cron_secret>` 保护

use axum::{extract::State, http::HeaderMap, Json};
use std::sync::Arc;

use crate::application::CleanupAudioCommand;
use crate::infrastructure::http::dto::CleanupDto;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// scheme 不区分大小写
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?;
    match value.get(..7) {
        Some(scheme) if scheme.eq_ignore_ascii_case("bearer ") => Some(value[7..].trim()),
        _ => None,
    }
}

/// `GET /api/cron/audio-cleanup`
pub async fn audio_cleanup(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<CleanupDto>, ApiError> {
    let secret = state
        .cron_secret
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::Internal("Cron secret is not configured".to_string()))?;

    if bearer_token(&headers) != Some(secret) {
        return Err(ApiError::Unauthorized("Unauthorized".to_string()));
    }

    let result = state
        .cleanup_handler
        .handle(CleanupAudioCommand::default())
        .await?;

    Ok(Json(result.into()))
}
