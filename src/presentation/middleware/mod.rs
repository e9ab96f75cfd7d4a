//! 前门中间件
//!
//! 每个入站请求在路由前依次经过：安全响应头、CORS 白名单、
//! 请求体大小限制、速率限制、访问日志。这里不涉及任何业务分支

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderName, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use crate::business::services::RateLimitResult;
use crate::business::GatewayContext;
use crate::infrastructure::config::CorsConfig;
use crate::shared::utils::client_identity;
use crate::shared::AppError;

/// 统一设置的安全响应头
pub fn security_headers() -> [(HeaderName, HeaderValue); 5] {
    [
        (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        (header::X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN")),
        (header::REFERRER_POLICY, HeaderValue::from_static("no-referrer")),
        (
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=15552000; includeSubDomains"),
        ),
        (
            HeaderName::from_static("x-dns-prefetch-control"),
            HeaderValue::from_static("off"),
        ),
    ]
}

/// 基于白名单的 CORS 策略
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("⚠️ 忽略无效的 CORS 来源: {}", origin);
                None
            }
        })
        .collect();

    info!("🌐 CORS 允许来源: {:?}", config.allowed_origins);

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
}

/// 根据 Content-Length 提前拒绝超限请求体
///
/// 分块上传由提取器和代理转发时的读取上限兜底
pub async fn body_limit_middleware(
    State(context): State<GatewayContext>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let limit = context.config.max_body_bytes;
    let declared = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<usize>().ok());

    if let Some(length) = declared {
        if length > limit {
            return Err(AppError::PayloadTooLarge { limit });
        }
    }

    Ok(next.run(request).await)
}

/// 按客户端标识的窗口限流
pub async fn rate_limit_middleware(
    State(context): State<GatewayContext>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let identity = client_identity(request.headers(), peer, context.config.server.trust_proxy);

    match context.rate_limiter.check_rate_limit(&identity).await {
        RateLimitResult::Allowed { remaining } => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert(
                HeaderName::from_static("x-ratelimit-limit"),
                HeaderValue::from(context.config.rate_limit.max_requests),
            );
            headers.insert(
                HeaderName::from_static("x-ratelimit-remaining"),
                HeaderValue::from(remaining),
            );
            Ok(response)
        }
        RateLimitResult::LimitExceeded { limit, reset_in_seconds } => Err(AppError::RateLimited {
            limit,
            retry_after_seconds: reset_in_seconds,
        }),
    }
}

/// 访问日志：每个请求一行
pub async fn access_log_middleware(
    State(context): State<GatewayContext>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_identity(request.headers(), peer, context.config.server.trust_proxy);
    let started = Instant::now();

    let response = next.run(request).await;

    info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        latency_ms = started.elapsed().as_millis() as u64,
        client = %client,
        "📥 访问日志"
    );

    response
}
