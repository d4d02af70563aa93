//! HTTP Error Handling
//!
//! 错误响应使用真实的 HTTP 状态码，响应体为 `{ "error": "..." }`

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::ApplicationError;

/// 统一错误响应格式
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// 错误详情，附在响应扩展中供日志中间件读取
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

/// API 错误
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    /// Range 无法满足，携带文件总大小
    RangeNotSatisfiable(u64),
    ServiceUnavailable(String),
    GatewayTimeout(String),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RangeNotSatisfiable(_) => StatusCode::RANGE_NOT_SATISFIABLE,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::NotFound(msg)
            | ApiError::ServiceUnavailable(msg)
            | ApiError::GatewayTimeout(msg)
            | ApiError::Internal(msg) => msg.clone(),
            ApiError::RangeNotSatisfiable(size) => {
                format!("Requested range not satisfiable (size {})", size)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();

        let mut response = (status, Json(ErrorResponse::new(message.clone()))).into_response();
        response.extensions_mut().insert(ErrorDetail(message));
        if let ApiError::RangeNotSatisfiable(size) = self {
            if let Ok(value) = format!("bytes */{}", size).parse() {
                response.headers_mut().insert(header::CONTENT_RANGE, value);
            }
        }
        response
    }
}

impl From<ApplicationError> for ApiError {
    fn from(e: ApplicationError) -> Self {
        match e {
            ApplicationError::NotFound { resource_type, id } => {
                ApiError::NotFound(format!("{} not found: {}", resource_type, id))
            }
            ApplicationError::ValidationError(msg) => ApiError::BadRequest(msg),
            ApplicationError::ExternalServiceTimeout(msg) => ApiError::GatewayTimeout(msg),
            ApplicationError::ExternalServiceUnavailable(msg) => ApiError::ServiceUnavailable(msg),
            ApplicationError::ExternalServiceError(msg)
            | ApplicationError::RepositoryError(msg)
            | ApplicationError::StorageError(msg)
            | ApplicationError::InternalError(msg) => ApiError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ResolveError;

    #[test]
    fn test_resolve_errors_map_to_distinct_statuses() {
        let cases = [
            (ResolveError::Timeout(30), StatusCode::GATEWAY_TIMEOUT),
            (
                ResolveError::Unavailable("yt-dlp not found".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (ResolveError::Empty, StatusCode::INTERNAL_SERVER_ERROR),
            (
                ResolveError::OutputTooLarge(65536),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let api: ApiError = ApplicationError::from(err).into();
            assert_eq!(api.status(), expected);
        }
    }

    #[test]
    fn test_range_not_satisfiable_sets_content_range() {
        let response = ApiError::RangeNotSatisfiable(1234).into_response();
        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(
            response.headers().get(header::CONTENT_RANGE).unwrap(),
            "bytes */1234"
        );
    }

    #[test]
    fn test_error_detail_attached_for_logging() {
        let response = ApiError::GatewayTimeout("resolver timed out".into()).into_response();
        let detail = response.extensions().get::<ErrorDetail>().unwrap();
        assert_eq!(detail.0, "resolver timed out");
    }
}
