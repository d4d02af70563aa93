//! Range-capable file serving
//!
//! 单个 `bytes=` 区间：`start-end`、`start-`、`-suffix`
//! 无法解析或多区间的 Range 头按规范忽略，返回完整文件

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
};
use futures_util::TryStreamExt;
use std::path::Path;
use tokio::{
    fs::File,
    io::{AsyncRead, AsyncReadExt, AsyncSeekExt, SeekFrom},
};
use tokio_util::io::ReaderStream;

use super::error::ApiError;

const STREAM_CHUNK_SIZE: usize = 64 * 1024;
const AUDIO_CONTENT_TYPE: &str = "audio/mpeg";
/// 缓存文件发布后内容不变
const AUDIO_CACHE_CONTROL: &str = "public, max-age=31536000";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// `bytes=start-` 或 `bytes=start-end`
    From { start: u64, end: Option<u64> },
    /// `bytes=-n`：最后 n 个字节
    Suffix(u64),
}

impl ByteRange {
    pub fn parse<S: AsRef<str>>(s: S) -> Option<ByteRange> {
        let spec = s.as_ref().trim().strip_prefix("bytes=")?;
        if spec.contains(',') {
            return None;
        }

        let (start, end) = spec.split_once('-')?;
        let (start, end) = (start.trim(), end.trim());

        if start.is_empty() {
            return end.parse().ok().map(ByteRange::Suffix);
        }

        let start = start.parse().ok()?;
        let end = if end.is_empty() {
            None
        } else {
            let end: u64 = end.parse().ok()?;
            if end < start {
                return None;
            }
            Some(end)
        };
        Some(ByteRange::From { start, end })
    }

    pub fn from_headers(headers: &HeaderMap) -> Option<ByteRange> {
        headers
            .get(header::RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(ByteRange::parse)
    }

    /// 对给定文件大小求出闭区间 `[start, end]`，无法满足时返回 None
    pub fn resolve(self, size: u64) -> Option<(u64, u64)> {
        if size == 0 {
            return None;
        }
        match self {
            ByteRange::From { start, .. } if start >= size => None,
            ByteRange::From { start, end } => {
                Some((start, end.map_or(size - 1, |end| end.min(size - 1))))
            }
            ByteRange::Suffix(0) => None,
            ByteRange::Suffix(len) => Some((size.saturating_sub(len), size - 1)),
        }
    }
}

/// 把 reader 包装为响应体
///
/// 读取错误记录日志后作为流错误传给 hyper，响应随之中止
fn stream_body<R>(reader: R, label: String) -> Body
where
    R: AsyncRead + Send + 'static,
{
    let stream = ReaderStream::with_capacity(reader, STREAM_CHUNK_SIZE).inspect_err(
        move |e| tracing::warn!(path = %label, error = %e, "Audio stream read failed"),
    );
    Body::from_stream(stream)
}

/// 以流的方式返回文件内容
///
/// 客户端断开时响应体被丢弃，文件句柄随之关闭
pub async fn serve_file(path: &Path, range: Option<ByteRange>) -> Result<Response, ApiError> {
    let mut file = File::open(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ApiError::NotFound("Audio file not found".to_string()),
        _ => ApiError::Internal(format!("Failed to open audio file: {}", e)),
    })?;

    // 以打开的句柄为准，发布是整体 rename，不会读到半个文件
    let size = file
        .metadata()
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to stat audio file: {}", e)))?
        .len();

    let span = match range {
        Some(range) => Some(range.resolve(size).ok_or(ApiError::RangeNotSatisfiable(size))?),
        None => None,
    };

    let (start, end) = span.unwrap_or((0, size.saturating_sub(1)));
    let length = if size == 0 { 0 } else { end - start + 1 };

    if start > 0 {
        file.seek(SeekFrom::Start(start))
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to seek audio file: {}", e)))?;
    }

    let mut builder = Response::builder()
        .header(header::CONTENT_TYPE, AUDIO_CONTENT_TYPE)
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CONTENT_LENGTH, length)
        .header(header::CACHE_CONTROL, HeaderValue::from_static(AUDIO_CACHE_CONTROL));

    builder = match span {
        Some((start, end)) => builder
            .status(StatusCode::PARTIAL_CONTENT)
            .header(header::CONTENT_RANGE, format!("bytes {}-{}/{}", start, end, size)),
        None => builder.status(StatusCode::OK),
    };

    builder
        .body(stream_body(file.take(length), path.display().to_string()))
        .map_err(|e| ApiError::Internal(format!("Failed to build response: {}", e)))
}
