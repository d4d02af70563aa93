//! Stream Resolver Port - 外部流地址解析
//!
//! 定义外部 URL 解析工具的抽象接口，具体实现在 infrastructure/adapters/ytdlp

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::VideoId;

/// 解析错误
///
/// 区分 "稍后重试"（超时）与 "服务端配置问题"（工具不可用）
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Resolver timed out after {0}s")]
    Timeout(u64),

    #[error("Resolver unavailable: {0}")]
    Unavailable(String),

    #[error("Resolver returned no stream URL")]
    Empty,

    #[error("Resolver output exceeded {0} bytes")]
    OutputTooLarge(usize),

    #[error("Resolver failed: {0}")]
    Failed(String),
}

/// Stream Resolver Port
#[async_trait]
pub trait StreamResolverPort: Send + Sync {
    /// 解析视频的音频流地址
    async fn resolve(&self, video_id: &VideoId) -> Result<String, ResolveError>;
}
