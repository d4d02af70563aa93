//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `SUBFEED_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `SUBFEED_SERVER__PORT=8080`
/// - `SUBFEED_CACHE__AUDIO_DIR=/var/lib/subfeed/audio`
/// - `SUBFEED_CACHE__QUOTA_BYTES=5368709120`
/// - `SUBFEED_CLEANUP__CRON_SECRET=...`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5060)?
        .set_default("database.path", "data/subfeed.db")?
        .set_default("database.max_connections", 5)?
        .set_default("cache.audio_dir", "data/audio")?
        .set_default("cache.quota_bytes", 10_u64 * 1024 * 1024 * 1024)?
        .set_default("cache.ceiling_percent", 90.0)?
        .set_default("cache.retention_days", 30)?
        .set_default("cache.trim_target_percent", 0.0)?
        .set_default("resolver.binary", "yt-dlp")?
        .set_default("resolver.timeout_secs", 30)?
        .set_default("resolver.max_output_bytes", 64 * 1024)?
        .set_default("resolver.download_timeout_secs", 600)?
        .set_default("resolver.url_ttl_secs", 5 * 3600)?
        .set_default("resolver.watch_url_base", "https://www.youtube.com/watch?v=")?
        .set_default("cleanup.enabled", true)?
        .set_default("cleanup.interval_secs", 86400)?
        .set_default("log.level", "info")?;

    // 2. 配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: SUBFEED_RESOLVER__BINARY=/usr/local/bin/yt-dlp
    // 注意: 环境变量名会被转换为小写
    builder = builder.add_source(
        Environment::with_prefix("SUBFEED")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
/// 进程超时上限（秒）
const MAX_TIMEOUT_SECS: u64 = 24 * 3600;
/// 流地址缓存 TTL 上限（秒）
const MAX_URL_TTL_SECS: u64 = 7 * 24 * 3600;
/// 保留期上限（天）
const MAX_RETENTION_DAYS: u32 = 3650;

fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.database.path.is_empty() {
        return Err(ConfigError::ValidationError(
            "Database path cannot be empty".to_string(),
        ));
    }

    if config.resolver.binary.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "Resolver binary cannot be empty".to_string(),
        ));
    }

    if config.resolver.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Resolver timeout cannot be 0".to_string(),
        ));
    }

    let resolver = &config.resolver;
    for (name, secs) in [
        ("Resolver timeout", resolver.timeout_secs),
        ("Download timeout", resolver.download_timeout_secs),
    ] {
        if secs > MAX_TIMEOUT_SECS {
            return Err(ConfigError::ValidationError(format!(
                "{} must be at most {} seconds, got {}",
                name, MAX_TIMEOUT_SECS, secs
            )));
        }
    }

    if resolver.url_ttl_secs > MAX_URL_TTL_SECS {
        return Err(ConfigError::ValidationError(format!(
            "Stream URL TTL must be at most {} seconds, got {}",
            MAX_URL_TTL_SECS, resolver.url_ttl_secs
        )));
    }

    let cache = &config.cache;
    if cache.quota_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "Cache quota cannot be 0".to_string(),
        ));
    }

    if !(cache.ceiling_percent > 0.0 && cache.ceiling_percent <= 100.0) {
        return Err(ConfigError::ValidationError(format!(
            "Cache ceiling must be within (0, 100], got {}",
            cache.ceiling_percent
        )));
    }

    if !(0.0..=cache.ceiling_percent).contains(&cache.trim_target_percent) {
        return Err(ConfigError::ValidationError(format!(
            "Cache trim target must be within [0, {}], got {}",
            cache.ceiling_percent, cache.trim_target_percent
        )));
    }

    if cache.retention_days > MAX_RETENTION_DAYS {
        return Err(ConfigError::ValidationError(format!(
            "Retention must be at most {} days, got {}",
            MAX_RETENTION_DAYS, cache.retention_days
        )));
    }

    if config.cleanup.enabled && config.cleanup.interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Cleanup interval cannot be 0 when cleanup is enabled".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("Database: {}", config.database.path);
    tracing::info!("Database Max Connections: {}", config.database.max_connections);
    tracing::info!("Audio Directory: {:?}", config.cache.audio_dir);
    tracing::info!(
        "Audio Quota: {} bytes (ceiling {}%)",
        config.cache.quota_bytes,
        config.cache.ceiling_percent
    );
    tracing::info!("Retention: {} days", config.cache.retention_days);
    if config.cache.trim_target_percent > 0.0 {
        tracing::info!("LRU Trim Target: {}%", config.cache.trim_target_percent);
    }
    tracing::info!("Resolver: {:?}", config.resolver.binary);
    tracing::info!("Resolver Timeout: {}s", config.resolver.timeout_secs);
    tracing::info!("Stream URL TTL: {}s", config.resolver.url_ttl_secs);
    tracing::info!("Cleanup Enabled: {}", config.cleanup.enabled);
    if config.cleanup.enabled {
        tracing::info!("Cleanup Interval: {}s", config.cleanup.interval_secs);
    }
    // 只打印是否配置，不打印内容
    tracing::info!(
        "Cron Secret: {}",
        if config.cleanup.cron_secret.is_some() {
            "configured"
        } else {
            "not set"
        }
    );
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
