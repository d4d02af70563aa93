//! Worker Layer - Background Task Processing
//!
//! 实现 CleanupWorker，定时清理音频缓存

mod cleanup_worker;

pub use cleanup_worker::{CleanupWorker, CleanupWorkerConfig};
