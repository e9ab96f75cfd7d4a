//! 集成测试公共工具：本地模拟后端和测试配置

#![allow(dead_code)]

use axum::{body::Body, http::Request, response::Response, Router};
use serde_json::Value;
use std::net::SocketAddr;
use tokio::net::TcpListener;

use unified_gateway::Config;

pub const SERVICE_NAMES: [&str; 5] = ["fallback", "silhouette", "assets", "mcp", "context"];

/// 在随机端口启动一个模拟后端，返回端口
pub async fn spawn_backend(app: Router) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .unwrap();
    });
    port
}

/// 获取一个当前无人监听的本地端口
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// 所有后端都指向不可达端口、超时都很短的配置
pub async fn test_config() -> Config {
    let port = closed_port().await;
    let mut config = Config::default();
    for name in SERVICE_NAMES {
        config = config.with_service(name, "127.0.0.1", port);
    }
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config.health.timeout_ms = 300;
    config.upstream.timeout_seconds = 2;
    config.upstream.connect_timeout_seconds = 1;
    config
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn read_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
