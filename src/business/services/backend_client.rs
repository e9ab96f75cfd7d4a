//! 后端JSON调用客户端
//!
//! 统一端点对后端的调用都经过这里：通过注册表解析地址，
//! 区分传输失败和后端自身返回的错误状态

use reqwest::{Client, Method};
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, warn};

use crate::business::services::registry::SharedServiceRegistry;
use crate::shared::{AppError, AppResult};

/// 后端调用客户端
#[derive(Clone)]
pub struct BackendClient {
    registry: SharedServiceRegistry,
    client: Client,
}

impl BackendClient {
    pub fn new(registry: SharedServiceRegistry, client: Client) -> Self {
        Self { registry, client }
    }

    pub async fn get_json(&self, service: &str, path: &str) -> AppResult<Value> {
        self.call(Method::GET, service, path, None).await
    }

    pub async fn post_json(&self, service: &str, path: &str, body: &Value) -> AppResult<Value> {
        self.call(Method::POST, service, path, Some(body)).await
    }

    async fn call(&self, method: Method, service: &str, path: &str, body: Option<&Value>) -> AppResult<Value> {
        let descriptor = self.registry.resolve(service)?;
        let url = descriptor.url_for(path);
        let started = Instant::now();

        let mut request = self.client.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            warn!(service, %method, path, error = %e, "后端调用失败");
            let reason = if e.is_timeout() { "timed out".to_string() } else { e.to_string() };
            crate::unreachable_backend!(service, reason)
        })?;

        let status = response.status();
        debug!(
            service,
            %method,
            path,
            status = status.as_u16(),
            latency_ms = started.elapsed().as_millis() as u64,
            "后端调用完成"
        );

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::DownstreamApplication {
                service: service.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        response.json::<Value>().await.map_err(|e| crate::unreachable_backend!(service, format!("invalid JSON response: {}", e)))
    }
}

