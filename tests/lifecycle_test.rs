//! 网关生命周期集成测试：真实监听端口、定时巡检的启动和取消

mod common;

use serde_json::Value;
use std::time::Duration;

use common::{spawn_backend, test_config};
use unified_gateway::business::domain::LifecycleState;
use unified_gateway::{Gateway, GatewayContext};

#[tokio::test]
async fn test_start_stop_cancels_health_monitor() {
    let mut config = test_config().await;
    config.health.interval_seconds = 1;
    let mut gateway = Gateway::new(GatewayContext::build(config).unwrap());
    assert_eq!(gateway.state().await, LifecycleState::Stopped);

    gateway.start().await.unwrap();
    assert_eq!(gateway.state().await, LifecycleState::Running);
    assert!(gateway.is_monitor_active());
    let addr = gateway.local_addr().unwrap();

    let body: Value = reqwest::get(format!("http://{}/health", addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");

    // 首轮巡检在一个周期之后触发
    assert_eq!(gateway.context().health.sweep_count(), 0);
    tokio::time::sleep(Duration::from_millis(1600)).await;
    assert!(gateway.context().health.sweep_count() >= 1);

    gateway.stop().await.unwrap();
    assert_eq!(gateway.state().await, LifecycleState::Stopped);
    assert!(!gateway.is_monitor_active());
    assert!(gateway.local_addr().is_none());

    let sweeps = gateway.context().health.sweep_count();
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(gateway.context().health.sweep_count(), sweeps);

    assert!(reqwest::get(format!("http://{}/health", addr)).await.is_err());
}

#[tokio::test]
async fn test_double_start_is_noop() {
    let mut gateway = Gateway::new(GatewayContext::build(test_config().await).unwrap());

    gateway.start().await.unwrap();
    let addr = gateway.local_addr();

    gateway.start().await.unwrap();
    assert_eq!(gateway.local_addr(), addr);
    assert_eq!(gateway.state().await, LifecycleState::Running);

    gateway.stop().await.unwrap();
    // 重复停止同样无副作用
    gateway.stop().await.unwrap();
    assert_eq!(gateway.state().await, LifecycleState::Stopped);
}

#[tokio::test]
async fn test_status_reports_running_and_forwards_client_address() {
    let backend = spawn_backend(axum::Router::new().fallback(
        |request: axum::extract::Request| async move {
            let forwarded_for = request
                .headers()
                .get("x-forwarded-for")
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);
            axum::Json(serde_json::json!({ "forwarded_for": forwarded_for }))
        },
    ))
    .await;
    let config = test_config().await.with_service("mcp", "127.0.0.1", backend);
    let mut gateway = Gateway::new(GatewayContext::build(config).unwrap());
    gateway.start().await.unwrap();
    let addr = gateway.local_addr().unwrap();

    let status: Value = reqwest::get(format!("http://{}/status", addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["gateway"]["running"], true);
    assert_eq!(status["gateway"]["state"], "RUNNING");

    let proxied: Value = reqwest::get(format!("http://{}/api/mcp/tools", addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(proxied["forwarded_for"], "127.0.0.1");

    gateway.stop().await.unwrap();
}
