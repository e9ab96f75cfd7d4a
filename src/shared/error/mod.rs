//! 统一错误处理模块
//!
//! 定义网关中所有错误类型，所有失败响应都携带 `error` 字段

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// 应用程序统一错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 注册表中不存在该服务（仅在启动时属于致命配置错误）
    #[error("Unknown service: {0}")]
    UnknownService(String),

    /// 后端连接失败或超时
    #[error("Backend {service} unreachable: {reason}")]
    BackendUnreachable { service: String, reason: String },

    /// 请求体超过上限
    #[error("Payload too large: limit is {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// 速率限制窗口已满
    #[error("Too many requests from this client, please try again later")]
    RateLimited { limit: u32, retry_after_seconds: i64 },

    /// 后端以自身的错误状态码响应
    #[error("Backend {service} responded with status {status}")]
    DownstreamApplication { service: String, status: u16, body: String },

    /// 统一端点失败，对外只暴露固定的提示信息
    #[error("{0}")]
    OperationFailed(String),

    /// 验证错误
    #[error("Invalid request: {0}")]
    Validation(String),

    /// 资源未找到错误
    #[error("{0}")]
    NotFound(String),

    /// 配置错误
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// 内部服务器错误
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// 获取HTTP状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::UnknownService(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BackendUnreachable { .. } => StatusCode::BAD_GATEWAY,
            AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::DownstreamApplication { .. } => StatusCode::BAD_GATEWAY,
            AppError::OperationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 获取错误代码
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::UnknownService(_) => "UNKNOWN_SERVICE",
            AppError::BackendUnreachable { .. } => "BACKEND_UNREACHABLE",
            AppError::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            AppError::RateLimited { .. } => "RATE_LIMITED",
            AppError::DownstreamApplication { .. } => "DOWNSTREAM_ERROR",
            AppError::OperationFailed(_) => "OPERATION_FAILED",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Configuration(_) => "CONFIG_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 返回给客户端的信息，后端地址和内部细节只进日志
    pub fn client_message(&self) -> String {
        match self {
            AppError::BackendUnreachable { .. } | AppError::DownstreamApplication { .. } => {
                "Bad gateway".to_string()
            }
            AppError::UnknownService(_) | AppError::Configuration(_) | AppError::Internal(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }

    /// 是否属于后端传输层故障（连接失败、超时）
    pub fn is_transport_failure(&self) -> bool {
        matches!(self, AppError::BackendUnreachable { .. })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let error_code = self.error_code();

        if status_code.is_server_error() {
            tracing::error!(
                status = ?status_code,
                error_code = error_code,
                error = %self,
                "处理请求时发生错误"
            );
        } else {
            tracing::warn!(
                status = ?status_code,
                error_code = error_code,
                error = %self,
                "请求被拒绝"
            );
        }

        let mut body = json!({
            "error": self.client_message(),
            "code": error_code,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        let retry_after = match &self {
            AppError::RateLimited { limit, retry_after_seconds } => {
                body["limit"] = json!(limit);
                body["retry_after_seconds"] = json!(retry_after_seconds);
                Some(*retry_after_seconds)
            }
            AppError::PayloadTooLarge { limit } => {
                body["limit"] = json!(limit);
                None
            }
            _ => None,
        };

        let mut response = (status_code, Json(body)).into_response();
        if let Some(seconds) = retry_after {
            if let Ok(value) = HeaderValue::from_str(&seconds.max(0).to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

/// 后端不可达错误构造宏
#[macro_export]
macro_rules! unreachable_backend {
    ($service:expr, $reason:expr) => {
        $crate::shared::error::AppError::BackendUnreachable {
            service: $service.to_string(),
            reason: $reason.to_string(),
        }
    };
}

/// 验证错误构造宏
#[macro_export]
macro_rules! validation_error {
    ($msg:expr) => {
        $crate::shared::error::AppError::Validation($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::shared::error::AppError::Validation(format!($fmt, $($arg)*))
    };
}

/// 内部错误构造宏
#[macro_export]
macro_rules! internal_error {
    ($msg:expr) => {
        $crate::shared::error::AppError::Internal($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::shared::error::AppError::Internal(format!($fmt, $($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_follow_category() {
        assert_eq!(
            AppError::BackendUnreachable { service: "fallback".into(), reason: "refused".into() }.status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::RateLimited { limit: 10, retry_after_seconds: 5 }.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(AppError::PayloadTooLarge { limit: 1 }.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            AppError::OperationFailed("LLM generation failed".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_operation_failure_body_carries_only_generic_message() {
        let response = AppError::OperationFailed("Chat failed".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Chat failed");
        assert_eq!(json["code"], "OPERATION_FAILED");
    }

    #[tokio::test]
    async fn test_bad_gateway_hides_backend_detail() {
        let response = AppError::BackendUnreachable {
            service: "fallback".into(),
            reason: "error sending request for url (http://10.1.2.3:3001/v1/x)".into(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Bad gateway");
        assert_eq!(json["code"], "BACKEND_UNREACHABLE");
        assert!(!String::from_utf8_lossy(&body).contains("10.1.2.3"));
    }

    #[tokio::test]
    async fn test_rate_limited_sets_retry_after() {
        let response = AppError::RateLimited { limit: 1000, retry_after_seconds: 42 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "42");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["limit"], 1000);
        assert!(json["error"].as_str().unwrap().contains("Too many requests"));
    }
}
