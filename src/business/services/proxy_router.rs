//! 反向代理路由
//!
//! 按路径前缀把请求透明转发到注册表中的后端，转发前剥离前缀，
//! 后端的状态码、响应头和响应体原样流式返回

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderMap, HeaderName, HeaderValue},
    response::Response,
};
use futures::StreamExt;
use reqwest::Client;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::business::domain::ProxyRule;
use crate::shared::{AppError, AppResult};

/// 不跨越代理转发的逐跳头
const HOP_BY_HOP_HEADERS: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// 反向代理路由器
pub struct ProxyRouter {
    rules: Vec<ProxyRule>,
    client: Client,
    max_body_bytes: usize,
}

impl ProxyRouter {
    pub fn new(mut rules: Vec<ProxyRule>, client: Client, max_body_bytes: usize) -> Self {
        // 最长前缀优先
        rules.sort_by(|a, b| b.path_prefix.len().cmp(&a.path_prefix.len()));
        for rule in &rules {
            info!("🔀 代理规则 {}/* -> {}", rule.path_prefix, rule.target.base_url());
        }

        Self {
            rules,
            client,
            max_body_bytes,
        }
    }

    pub fn rules(&self) -> &[ProxyRule] {
        &self.rules
    }

    /// 匹配代理规则并返回改写后的路径
    pub fn match_route(&self, path: &str) -> Option<(&ProxyRule, String)> {
        self.rules
            .iter()
            .find(|rule| rule.matches(path))
            .map(|rule| (rule, rule.rewrite(path)))
    }

    /// 转发请求到匹配的后端
    pub async fn forward(&self, request: Request, client_addr: Option<SocketAddr>) -> AppResult<Response> {
        let (parts, body) = request.into_parts();
        let method = parts.method.clone();
        let original_path = parts.uri.path().to_string();

        let (rule, rewritten) = self
            .match_route(&original_path)
            .ok_or_else(|| AppError::NotFound("Not found".to_string()))?;

        let path_and_query = match parts.uri.query() {
            Some(query) => format!("{}?{}", rewritten, query),
            None => rewritten,
        };
        let target_url = rule.target.url_for(&path_and_query);

        let body_bytes = read_body(body, self.max_body_bytes).await?;

        let headers = forwarded_request_headers(&parts.headers, client_addr);
        let started = Instant::now();

        let upstream = self
            .client
            .request(method.clone(), &target_url)
            .headers(headers)
            .body(body_bytes)
            .send()
            .await
            .map_err(|e| {
                error!(
                    method = %method,
                    path = %original_path,
                    service = %rule.target.name,
                    error = %e,
                    "❌ 代理转发失败"
                );
                let reason = if e.is_timeout() { "timed out".to_string() } else { e.to_string() };
                crate::unreachable_backend!(rule.target.name, reason)
            })?;

        let status = upstream.status();
        info!(
            method = %method,
            path = %original_path,
            service = %rule.target.name,
            target = %path_and_query,
            status = status.as_u16(),
            latency_ms = started.elapsed().as_millis() as u64,
            "🔀 代理转发完成"
        );

        let mut response = Response::builder().status(status);
        if let Some(response_headers) = response.headers_mut() {
            for (name, value) in upstream.headers() {
                if !is_hop_by_hop(name) {
                    response_headers.append(name.clone(), value.clone());
                }
            }
        }

        response
            .body(Body::from_stream(upstream.bytes_stream()))
            .map_err(|e| crate::internal_error!("构建代理响应失败: {}", e))
    }
}

/// 读取请求体：超过上限为 413，读取中断（例如客户端断开）为 400
///
/// 声明了 Content-Length 的请求已在前门管道检查过，这里兜底分块上传
async fn read_body(body: Body, limit: usize) -> AppResult<Vec<u8>> {
    let mut stream = body.into_data_stream();
    let mut buffer = Vec::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| {
            warn!(error = %e, "⚠️ 读取请求体失败");
            crate::validation_error!("failed to read request body")
        })?;
        if buffer.len() + chunk.len() > limit {
            return Err(AppError::PayloadTooLarge { limit });
        }
        buffer.extend_from_slice(&chunk);
    }

    Ok(buffer)
}

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP_HEADERS.contains(&name.as_str())
}

/// 构造转发给后端的请求头：去掉逐跳头和 Host，追加 X-Forwarded-*
fn forwarded_request_headers(incoming: &HeaderMap, client_addr: Option<SocketAddr>) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(incoming.len() + 3);
    for (name, value) in incoming {
        if is_hop_by_hop(name) || name == header::HOST || name == header::CONTENT_LENGTH {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }

    if let Some(addr) = client_addr {
        let forwarded_for = match incoming.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
            Some(existing) => format!("{}, {}", existing, addr.ip()),
            None => addr.ip().to_string(),
        };
        if let Ok(value) = HeaderValue::from_str(&forwarded_for) {
            headers.insert("x-forwarded-for", value);
        }
    }
    if let Some(host) = incoming.get(header::HOST) {
        headers.insert("x-forwarded-host", host.clone());
    }
    headers.insert("x-forwarded-proto", HeaderValue::from_static("http"));

    headers
}

pub type SharedProxyRouter = Arc<ProxyRouter>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::business::domain::ServiceDescriptor;

    fn router() -> ProxyRouter {
        let rules = ["fallback", "silhouette", "assets", "mcp", "context"]
            .iter()
            .enumerate()
            .map(|(i, name)| ProxyRule::for_service(ServiceDescriptor::new(*name, "localhost", 3001 + i as u16)))
            .collect();
        ProxyRouter::new(rules, Client::new(), 1024)
    }

    #[test]
    fn test_match_route_strips_prefix() {
        let router = router();

        let (rule, path) = router.match_route("/api/fallback/v1/x").unwrap();
        assert_eq!(rule.target.name, "fallback");
        assert_eq!(path, "/v1/x");

        let (rule, path) = router.match_route("/api/mcp").unwrap();
        assert_eq!(rule.target.name, "mcp");
        assert_eq!(path, "/");
    }

    #[test]
    fn test_match_route_misses() {
        let router = router();

        assert!(router.match_route("/api/unknown/x").is_none());
        assert!(router.match_route("/api/contextual").is_none());
        assert!(router.match_route("/health").is_none());
    }

    #[test]
    fn test_longest_prefix_wins() {
        let rules = vec![
            ProxyRule::for_service(ServiceDescriptor::new("assets", "a", 1)),
            ProxyRule {
                path_prefix: "/api/assets/raw".to_string(),
                target: ServiceDescriptor::new("raw", "b", 2),
                strip_prefix: "/api/assets/raw".to_string(),
            },
        ];
        let router = ProxyRouter::new(rules, Client::new(), 1024);

        let (rule, path) = router.match_route("/api/assets/raw/logo.png").unwrap();
        assert_eq!(rule.target.name, "raw");
        assert_eq!(path, "/logo.png");
    }

    fn chunked_request(chunks: Vec<Result<Vec<u8>, std::io::Error>>) -> Request {
        Request::builder()
            .method("POST")
            .uri("/api/fallback/upload")
            .body(Body::from_stream(futures::stream::iter(chunks)))
            .unwrap()
    }

    #[tokio::test]
    async fn test_oversized_chunked_body_is_payload_too_large() {
        let router = router();
        let request = chunked_request(vec![Ok(vec![0u8; 600]), Ok(vec![0u8; 600])]);

        let err = router.forward(request, None).await.unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge { limit: 1024 }));
    }

    #[tokio::test]
    async fn test_interrupted_body_is_bad_request() {
        let router = router();
        let request = chunked_request(vec![
            Ok(vec![1u8; 10]),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "client went away")),
        ]);

        let err = router.forward(request, None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_forwarded_headers() {
        let mut incoming = HeaderMap::new();
        incoming.insert(header::HOST, HeaderValue::from_static("gateway.local"));
        incoming.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        incoming.insert("x-request-id", HeaderValue::from_static("abc"));

        let addr: SocketAddr = "192.168.1.20:4000".parse().unwrap();
        let headers = forwarded_request_headers(&incoming, Some(addr));

        assert!(headers.get(header::HOST).is_none());
        assert!(headers.get(header::CONNECTION).is_none());
        assert_eq!(headers.get("x-request-id").unwrap(), "abc");
        assert_eq!(headers.get("x-forwarded-for").unwrap(), "192.168.1.20");
        assert_eq!(headers.get("x-forwarded-host").unwrap(), "gateway.local");
    }
}
