//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（AudioStore、Downloader、StreamResolver、UrlCache、DownloadCoordinator）
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports
pub use commands::{handlers::CleanupAudioHandler, CleanupAudioCommand, CleanupAudioResponse};

pub use error::ApplicationError;

pub use ports::{
    // Local file store
    AudioStoreError,
    AudioStorePort,
    SweepResult,
    // External downloader / resolver
    AudioDownloaderPort,
    DownloadError,
    ResolveError,
    StreamResolverPort,
    // Single-flight
    DownloadCoordinatorPort,
    DownloadStatus,
    SpawnOutcome,
    // URL cache
    RepositoryError,
    UrlCacheRecord,
    UrlCacheRepositoryPort,
};

pub use queries::{
    AudioSource,
    CacheStatsResponse,
    DownloadStatusResponse,
    GetAudioFileQuery,
    GetAudioQuery,
    GetAudioResponse,
    GetCacheStatsQuery,
    GetDownloadStatusQuery,
    LocalAudioFile,
    ResolveStreamUrlQuery,
    ResolvedStreamUrl,
    // Handlers
    handlers::{
        GetAudioFileHandler, GetAudioHandler, GetCacheStatsHandler, GetDownloadStatusHandler,
        ResolveStreamUrlHandler,
    },
};
