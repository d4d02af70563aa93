//! Subfeed - 订阅视频聚合的音频缓存服务
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Audio Context: 视频 ID、磁盘用量、缓存策略
//!
//! 应用层 (application/):
//! - Ports: 端口定义（AudioStore, Downloader, StreamResolver, UrlCache, DownloadCoordinator）
//! - Commands: 缓存清理
//! - Queries: 播放来源决策、本地文件、下载状态、缓存统计
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API + Range 文件服务
//! - Memory: 后台下载 single-flight
//! - Worker: CleanupWorker 定时清理
//! - Persistence: SQLite 外部流地址缓存
//! - Adapters: 本地文件存储, yt-dlp

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
