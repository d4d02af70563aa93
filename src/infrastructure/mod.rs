//! Infrastructure Layer - 基础设施层
//!
//! 提供所有端口的具体实现

pub mod adapters;
pub mod http;
pub mod memory;
pub mod persistence;
pub mod worker;

pub use adapters::{FileAudioStore, YtDlpClient, YtDlpClientConfig};
pub use memory::InMemoryDownloadCoordinator;
pub use persistence::SqliteUrlCacheRepository;
pub use worker::{CleanupWorker, CleanupWorkerConfig};
