//! HTTP Middleware
//!
//! HTTP 状态码错误日志中间件

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use super::error::ErrorDetail;

/// HTTP 状态码错误日志中间件
///
/// 错误只在这里记录一次。4xx 记录 warn，5xx 记录 error；416 是播放器 seek 越界的常见情况，只记录 debug
pub async fn error_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis() as u64;
    let detail = response
        .extensions()
        .get::<ErrorDetail>()
        .map(|d| d.0.as_str())
        .unwrap_or("");

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            elapsed_ms = elapsed_ms,
            error = %detail,
            "HTTP server error"
        );
    } else if status == http::StatusCode::RANGE_NOT_SATISFIABLE {
        tracing::debug!(
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            "Range not satisfiable"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            elapsed_ms = elapsed_ms,
            error = %detail,
            "HTTP client error"
        );
    }

    response
}
