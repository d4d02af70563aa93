//! In-Memory Implementations
//!
//! 进程内状态：后台下载 single-flight 表

mod download_coordinator;

pub use download_coordinator::{DownloadTask, InMemoryDownloadCoordinator};
