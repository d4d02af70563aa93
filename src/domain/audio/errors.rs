//! Audio Context - Errors

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AudioError {
    #[error("无效的视频 ID: {0:?}")]
    InvalidVideoId(String),
}
