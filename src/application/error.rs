//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use thiserror::Error;

use crate::application::ports::{AudioStoreError, RepositoryError, ResolveError};
use crate::domain::AudioError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 资源未找到
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 外部解析超时（可稍后重试）
    #[error("External service timeout: {0}")]
    ExternalServiceTimeout(String),

    /// 外部工具不可用（服务端配置问题）
    #[error("External service unavailable: {0}")]
    ExternalServiceUnavailable(String),

    /// 外部服务错误
    #[error("External service error: {0}")]
    ExternalServiceError(String),

    /// 仓储错误
    #[error("Repository error: {0}")]
    RepositoryError(String),

    /// 存储错误
    #[error("Storage error: {0}")]
    StorageError(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type,
            id: id.into(),
        }
    }
}

impl From<AudioError> for ApplicationError {
    fn from(err: AudioError) -> Self {
        Self::ValidationError(err.to_string())
    }
}

impl From<RepositoryError> for ApplicationError {
    fn from(err: RepositoryError) -> Self {
        Self::RepositoryError(err.to_string())
    }
}

impl From<AudioStoreError> for ApplicationError {
    fn from(err: AudioStoreError) -> Self {
        Self::StorageError(err.to_string())
    }
}

impl From<ResolveError> for ApplicationError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::Timeout(_) => Self::ExternalServiceTimeout(err.to_string()),
            ResolveError::Unavailable(_) => Self::ExternalServiceUnavailable(err.to_string()),
            ResolveError::Empty | ResolveError::OutputTooLarge(_) | ResolveError::Failed(_) => {
                Self::ExternalServiceError(err.to_string())
            }
        }
    }
}
