//! Audio Context - 音频缓存限界上下文
//!
//! 职责:
//! - 视频 ID 校验（同时作为文件名和外部工具参数）
//! - 本地缓存文件与磁盘用量快照
//! - 缓存准入与淘汰策略

mod entities;
mod errors;
mod policy;
mod value_objects;

pub use entities::CachedAudioFile;
pub use errors::AudioError;
pub use policy::{CachePolicy, EvictionPlan};
pub use value_objects::{DiskUsage, VideoId};
