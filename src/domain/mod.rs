//! Domain Layer - 领域层
//!
//! 限界上下文:
//! - Audio Context: 音频缓存（视频 ID、磁盘用量、准入与淘汰策略）

pub mod audio;

pub use audio::{AudioError, CachePolicy, CachedAudioFile, DiskUsage, EvictionPlan, VideoId};
