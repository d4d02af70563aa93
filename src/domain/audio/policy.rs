//! Audio Context - Cache Policy
//!
//! 准入：新的后台下载只在用量低于上限时放行，本身不淘汰任何文件
//! 淘汰：按最近播放时间清理超过保留期的文件；可选地按 LRU 继续清理到目标用量

use chrono::{DateTime, Duration, Utc};

use super::{CachedAudioFile, DiskUsage};

/// 缓存策略
#[derive(Debug, Clone)]
pub struct CachePolicy {
    /// 准入上限（百分比），达到即拒绝新下载
    pub ceiling_percent: f64,
    /// 保留期：最近播放早于 now - retention 的文件会被清理
    pub retention: Duration,
    /// LRU 清理目标（百分比），None 表示只按时间清理
    pub trim_target_percent: Option<f64>,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            ceiling_percent: 90.0,
            retention: Duration::days(30),
            trim_target_percent: None,
        }
    }
}

/// 一次清理的候选文件
#[derive(Debug, Clone, Default)]
pub struct EvictionPlan {
    /// 超过保留期的文件
    pub stale: Vec<CachedAudioFile>,
    /// 为回到目标用量而按 LRU 选出的文件
    pub over_quota: Vec<CachedAudioFile>,
}

impl EvictionPlan {
    pub fn len(&self) -> usize {
        self.stale.len() + self.over_quota.len()
    }

    pub fn victims(&self) -> impl Iterator<Item = &CachedAudioFile> {
        self.stale.iter().chain(self.over_quota.iter())
    }
}

impl CachePolicy {
    pub fn new(ceiling_percent: f64, retention: Duration) -> Self {
        Self {
            ceiling_percent,
            retention,
            trim_target_percent: None,
        }
    }

    pub fn with_trim_target(mut self, percent: f64) -> Self {
        self.trim_target_percent = (percent > 0.0).then_some(percent);
        self
    }

    /// 是否允许开始新的后台下载
    pub fn admits(&self, usage: &DiskUsage) -> bool {
        usage.usage_percent() < self.ceiling_percent
    }

    /// 最近播放时间是否已超过保留期
    pub fn is_stale(&self, last_played_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now - last_played_at > self.retention
    }

    /// 选出本次清理要删除的文件
    pub fn plan_eviction(
        &self,
        files: Vec<CachedAudioFile>,
        usage: &DiskUsage,
        now: DateTime<Utc>,
    ) -> EvictionPlan {
        let (stale, mut fresh): (Vec<_>, Vec<_>) = files
            .into_iter()
            .partition(|f| self.is_stale(f.last_played_at, now));

        let mut plan = EvictionPlan {
            stale,
            over_quota: Vec::new(),
        };

        let Some(target_percent) = self.trim_target_percent else {
            return plan;
        };

        let target_bytes = (usage.quota_bytes as f64 * target_percent / 100.0) as u64;
        let stale_bytes: u64 = plan.stale.iter().map(|f| f.size_bytes).sum();
        let mut projected = usage.total_size_bytes.saturating_sub(stale_bytes);

        // 最久未播放的排在前面
        fresh.sort_by_key(|f| f.last_played_at);
        for file in fresh {
            if projected <= target_bytes {
                break;
            }
            projected = projected.saturating_sub(file.size_bytes);
            plan.over_quota.push(file);
        }

        plan
    }
}
