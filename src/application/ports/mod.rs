//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_downloader;
mod audio_store;
mod download_coordinator;
mod stream_resolver;
mod url_cache;

pub use audio_downloader::{AudioDownloaderPort, DownloadError};
pub use audio_store::{AudioStoreError, AudioStorePort, SweepResult};
pub use download_coordinator::{DownloadCoordinatorPort, DownloadStatus, SpawnOutcome};
pub use stream_resolver::{ResolveError, StreamResolverPort};
pub use url_cache::{RepositoryError, UrlCacheRecord, UrlCacheRepositoryPort};
