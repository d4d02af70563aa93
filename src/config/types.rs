//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 数据库配置
    #[serde(default)]
    pub database: DatabaseConfig,

    /// 音频缓存配置
    #[serde(default)]
    pub cache: CacheConfig,

    /// 外部解析器（yt-dlp）配置
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// 定时清理配置
    #[serde(default)]
    pub cleanup: CleanupConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5060
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库文件路径
    #[serde(default = "default_db_path")]
    pub path: String,

    /// 最大连接数
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> String {
    "data/subfeed.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    /// 获取数据库 URL
    pub fn database_url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.path)
    }
}

/// 音频缓存配置
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// 缓存根目录
    #[serde(default = "default_audio_dir")]
    pub audio_dir: PathBuf,

    /// 磁盘配额（字节）
    #[serde(default = "default_quota_bytes")]
    pub quota_bytes: u64,

    /// 用量达到该百分比后不再开始新的后台下载
    #[serde(default = "default_ceiling_percent")]
    pub ceiling_percent: f64,

    /// 保留期（天），超过未播放即清理
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    /// 清理时按 LRU 压到的目标用量（百分比），0 表示关闭
    #[serde(default)]
    pub trim_target_percent: f64,
}

fn default_audio_dir() -> PathBuf {
    PathBuf::from("data/audio")
}

fn default_quota_bytes() -> u64 {
    10 * 1024 * 1024 * 1024 // 10 GB
}

fn default_ceiling_percent() -> f64 {
    90.0
}

fn default_retention_days() -> u32 {
    30
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            audio_dir: default_audio_dir(),
            quota_bytes: default_quota_bytes(),
            ceiling_percent: default_ceiling_percent(),
            retention_days: default_retention_days(),
            trim_target_percent: 0.0,
        }
    }
}

/// 外部解析器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    /// yt-dlp 可执行文件
    #[serde(default = "default_binary")]
    pub binary: PathBuf,

    /// 解析超时（秒）
    #[serde(default = "default_resolver_timeout")]
    pub timeout_secs: u64,

    /// 解析输出上限（字节）
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,

    /// 后台下载超时（秒）
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,

    /// 外部 URL 缓存有效期（秒）
    #[serde(default = "default_url_ttl")]
    pub url_ttl_secs: u64,

    /// 视频页面地址前缀
    #[serde(default = "default_watch_url_base")]
    pub watch_url_base: String,
}

fn default_binary() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_resolver_timeout() -> u64 {
    30
}

fn default_max_output_bytes() -> usize {
    64 * 1024
}

fn default_download_timeout() -> u64 {
    600
}

fn default_url_ttl() -> u64 {
    5 * 3600 // 5 小时
}

fn default_watch_url_base() -> String {
    "https://www.youtube.com/watch?v=".to_string()
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            timeout_secs: default_resolver_timeout(),
            max_output_bytes: default_max_output_bytes(),
            download_timeout_secs: default_download_timeout(),
            url_ttl_secs: default_url_ttl(),
            watch_url_base: default_watch_url_base(),
        }
    }
}

/// 定时清理配置
#[derive(Debug, Clone, Deserialize)]
pub struct CleanupConfig {
    /// 是否启用进程内定时清理
    #[serde(default = "default_cleanup_enabled")]
    pub enabled: bool,

    /// 清理间隔（秒）
    #[serde(default = "default_cleanup_interval")]
    pub interval_secs: u64,

    /// `/api/cron/audio-cleanup` 的 Bearer token，未设置时该接口返回 500
    #[serde(default)]
    pub cron_secret: Option<String>,
}

fn default_cleanup_enabled() -> bool {
    true
}

fn default_cleanup_interval() -> u64 {
    86400 // 24 小时
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: default_cleanup_enabled(),
            interval_secs: default_cleanup_interval(),
            cron_secret: None,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
