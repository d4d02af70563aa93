//! Cleanup Worker - 定时清理音频缓存

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::application::commands::handlers::CleanupAudioHandler;
use crate::application::commands::CleanupAudioCommand;

/// Worker 配置
#[derive(Debug, Clone)]
pub struct CleanupWorkerConfig {
    /// 清理间隔
    pub interval: Duration,
}

impl Default for CleanupWorkerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(86400),
        }
    }
}

/// 清理 Worker
///
/// 按固定间隔执行一次缓存清理，收到关闭信号后退出
pub struct CleanupWorker {
    config: CleanupWorkerConfig,
    handler: Arc<CleanupAudioHandler>,
    shutdown: watch::Receiver<bool>,
}

impl CleanupWorker {
    pub fn new(
        config: CleanupWorkerConfig,
        handler: Arc<CleanupAudioHandler>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            config,
            handler,
            shutdown,
        }
    }

    /// 启动 Worker
    pub async fn run(mut self) {
        tracing::info!(
            interval_secs = self.config.interval.as_secs(),
            "CleanupWorker started"
        );

        // 第一次清理在一个间隔之后
        let mut ticker = interval_at(Instant::now() + self.config.interval, self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.handler.handle(CleanupAudioCommand::default()).await {
                        tracing::error!(error = %e, "Scheduled audio cleanup failed");
                    }
                }
                changed = self.shutdown.changed() => {
                    // 发送端被丢弃同样视为关闭
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("CleanupWorker stopped");
    }
}
