//! Data Transfer Objects
//!
//! JSON 字段使用 camelCase

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::application::{
    AudioSource, CacheStatsResponse, CleanupAudioResponse, DownloadStatus,
    DownloadStatusResponse, GetAudioResponse,
};
use crate::domain::DiskUsage;

/// 保留两位小数
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ============================================================================
// Audio DTOs
// ============================================================================

/// `GET /api/audio/:videoId`
#[derive(Debug, Serialize)]
pub struct AudioResponse {
    #[serde(rename = "type")]
    pub source: AudioSource,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downloading: Option<bool>,
}

impl From<GetAudioResponse> for AudioResponse {
    fn from(r: GetAudioResponse) -> Self {
        match r.source {
            AudioSource::Local => Self {
                source: r.source,
                url: r.url,
                cached: Some(true),
                downloading: None,
            },
            AudioSource::Stream => Self {
                source: r.source,
                url: r.url,
                cached: Some(r.cached),
                downloading: Some(r.downloading),
            },
        }
    }
}

/// `GET /api/audio/:videoId/status`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadStatusDto {
    pub video_id: String,
    #[serde(flatten)]
    pub status: DownloadStatus,
}

impl From<DownloadStatusResponse> for DownloadStatusDto {
    fn from(r: DownloadStatusResponse) -> Self {
        Self {
            video_id: r.video_id.to_string(),
            status: r.status,
        }
    }
}

// ============================================================================
// Cache DTOs
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageDto {
    pub total_files: u64,
    #[serde(rename = "totalSizeGB")]
    pub total_size_gb: f64,
    pub usage_percent: f64,
}

impl From<&DiskUsage> for UsageDto {
    fn from(u: &DiskUsage) -> Self {
        Self {
            total_files: u.total_files,
            total_size_gb: round2(u.total_size_gb()),
            usage_percent: round2(u.usage_percent()),
        }
    }
}

/// `GET /api/audio-cache/stats`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatsDto {
    pub total_files: u64,
    pub total_size_bytes: u64,
    pub quota_bytes: u64,
    pub usage_percent: f64,
    pub ceiling_percent: f64,
    pub accepting_downloads: bool,
    pub in_flight_downloads: usize,
}

impl From<CacheStatsResponse> for CacheStatsDto {
    fn from(r: CacheStatsResponse) -> Self {
        Self {
            total_files: r.usage.total_files,
            total_size_bytes: r.usage.total_size_bytes,
            quota_bytes: r.usage.quota_bytes,
            usage_percent: round2(r.usage.usage_percent()),
            ceiling_percent: r.ceiling_percent,
            accepting_downloads: r.accepting_downloads,
            in_flight_downloads: r.in_flight_downloads,
        }
    }
}

/// `GET /api/cron/audio-cleanup`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupDto {
    pub deleted_files: u64,
    #[serde(rename = "freedMB")]
    pub freed_mb: f64,
    pub current_usage: UsageDto,
    pub completed_at: DateTime<Utc>,
}

impl From<CleanupAudioResponse> for CleanupDto {
    fn from(r: CleanupAudioResponse) -> Self {
        Self {
            deleted_files: r.deleted_files,
            freed_mb: round2(r.freed_mb()),
            current_usage: UsageDto::from(&r.usage),
            completed_at: Utc::now(),
        }
    }
}
