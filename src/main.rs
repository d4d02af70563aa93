//! Subfeed - 音频缓存服务
//!
//! - Domain: audio/
//! - Application: commands, queries, ports
//! - Infrastructure: http, memory, worker, persistence, adapters

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use subfeed::application::{AudioStorePort, CleanupAudioHandler};
use subfeed::config::{load_config, print_config};
use subfeed::domain::CachePolicy;
use subfeed::infrastructure::adapters::{FileAudioStore, YtDlpClient, YtDlpClientConfig};
use subfeed::infrastructure::http::{AppState, HttpServer, ServerConfig};
use subfeed::infrastructure::memory::InMemoryDownloadCoordinator;
use subfeed::infrastructure::persistence::sqlite::{
    create_pool, run_migrations, DatabaseConfig, SqliteUrlCacheRepository,
};
use subfeed::infrastructure::worker::{CleanupWorker, CleanupWorkerConfig};
use tokio::sync::watch;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!(
        "{},subfeed={},tower_http=debug",
        config.log.level, config.log.level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter)),
        )
        .init();

    tracing::info!("Subfeed - audio cache service");
    print_config(&config);

    // 确保数据目录存在
    tokio::fs::create_dir_all(&config.cache.audio_dir).await?;
    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // 初始化数据库
    let db_config = DatabaseConfig {
        database_url: config.database.database_url(),
        max_connections: config.database.max_connections,
    };
    let pool = create_pool(&db_config).await?;
    run_migrations(&pool).await?;
    let url_cache = Arc::new(SqliteUrlCacheRepository::new(pool.clone()));

    // 本地缓存目录
    let audio_store = Arc::new(
        FileAudioStore::new(&config.cache.audio_dir, config.cache.quota_bytes).await?,
    );

    // 上次进程退出时残留的 staging 文件
    let staging_max_age = chrono::Duration::seconds(config.resolver.download_timeout_secs as i64);
    if let Err(e) = audio_store.purge_staging(Utc::now() - staging_max_age).await {
        tracing::warn!(error = %e, "Failed to purge staging directory");
    }

    // yt-dlp：同时作为流地址解析器和下载器
    let ytdlp = Arc::new(YtDlpClient::new(YtDlpClientConfig {
        binary: config.resolver.binary.clone(),
        timeout_secs: config.resolver.timeout_secs,
        max_output_bytes: config.resolver.max_output_bytes,
        download_timeout_secs: config.resolver.download_timeout_secs,
        watch_url_base: config.resolver.watch_url_base.clone(),
    }));

    // 进程内唯一的下载协调器
    let coordinator = Arc::new(InMemoryDownloadCoordinator::new(
        audio_store.clone(),
        ytdlp.clone(),
    ));

    let policy = CachePolicy::new(
        config.cache.ceiling_percent,
        chrono::Duration::days(config.cache.retention_days as i64),
    )
    .with_trim_target(config.cache.trim_target_percent);

    let cleanup_handler = Arc::new(CleanupAudioHandler::new(
        audio_store.clone(),
        policy.clone(),
        staging_max_age,
    ));

    // 关闭信号
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // 启动 CleanupWorker
    let worker_handle = if config.cleanup.enabled {
        let worker = CleanupWorker::new(
            CleanupWorkerConfig {
                interval: Duration::from_secs(config.cleanup.interval_secs),
            },
            cleanup_handler.clone(),
            shutdown_rx,
        );
        Some(tokio::spawn(worker.run()))
    } else {
        None
    };

    // 创建 HTTP 服务器
    let server_config = ServerConfig::new(&config.server.host, config.server.port);
    let state = AppState::new(
        audio_store,
        coordinator,
        url_cache,
        ytdlp,
        policy,
        chrono::Duration::seconds(config.resolver.url_ttl_secs as i64),
        cleanup_handler,
        config.cleanup.cron_secret.clone(),
    );

    let server = HttpServer::new(server_config, Arc::new(state));

    tracing::info!("Starting HTTP server...");

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    let _ = shutdown_tx.send(true);
    if let Some(handle) = worker_handle {
        let _ = handle.await;
    }
    pool.close().await;

    tracing::info!("Server shutdown complete");

    Ok(())
}
