//! 团队服务桩
//!
//! 所有团队微服务共用的可配置组件：一个名字加一份固定响应模板，
//! 只实现网关依赖的两个接口 `GET /health` 和 `POST /execute`

use axum::{extract::State, routing::{get, post}, Json, Router};
use chrono::Utc;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::info;

/// 团队服务桩
#[derive(Debug, Clone)]
pub struct TeamStub {
    pub name: String,
    pub template: Value,
}

impl TeamStub {
    pub fn new(name: impl Into<String>, template: Value) -> Self {
        Self {
            name: name.into(),
            template,
        }
    }

    /// 默认模板
    pub fn with_default_template(name: impl Into<String>) -> Self {
        Self::new(
            name,
            json!({
                "status": "completed",
                "result": "Task executed successfully",
            }),
        )
    }

    /// 健康检查负载
    pub fn health_payload(&self) -> Value {
        json!({
            "status": "healthy",
            "team": self.name,
            "timestamp": Utc::now().to_rfc3339(),
        })
    }

    /// 执行任务：模板字段原样保留，附加团队名、任务名和时间戳
    pub fn execute_payload(&self, request: &Value) -> Value {
        let mut payload = match &self.template {
            Value::Object(fields) => fields.clone(),
            other => {
                let mut fields = Map::new();
                fields.insert("result".to_string(), other.clone());
                fields
            }
        };
        payload.insert("team".to_string(), json!(self.name));
        payload.insert(
            "task".to_string(),
            request.get("task").cloned().unwrap_or(Value::Null),
        );
        payload.insert("timestamp".to_string(), json!(Utc::now().to_rfc3339()));
        Value::Object(payload)
    }

    pub fn router(self) -> Router {
        Router::new()
            .route("/health", get(health))
            .route("/execute", post(execute))
            .with_state(Arc::new(self))
    }
}

async fn health(State(stub): State<Arc<TeamStub>>) -> Json<Value> {
    Json(stub.health_payload())
}

async fn execute(State(stub): State<Arc<TeamStub>>, Json(request): Json<Value>) -> Json<Value> {
    info!(team = %stub.name, task = ?request.get("task"), "📋 团队任务执行");
    Json(stub.execute_payload(&request))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::{Request, StatusCode}};
    use tower::ServiceExt;

    #[test]
    fn test_execute_payload_uses_template() {
        let stub = TeamStub::new("communications-team", json!({ "status": "completed", "channel": "email" }));

        let payload = stub.execute_payload(&json!({ "task": "notify", "parameters": {} }));

        assert_eq!(payload["team"], "communications-team");
        assert_eq!(payload["task"], "notify");
        assert_eq!(payload["status"], "completed");
        assert_eq!(payload["channel"], "email");
    }

    #[test]
    fn test_non_object_template_is_wrapped() {
        let stub = TeamStub::new("design-team", json!("ok"));
        let payload = stub.execute_payload(&json!({}));

        assert_eq!(payload["result"], "ok");
        assert!(payload["task"].is_null());
    }

    #[tokio::test]
    async fn test_health_route() {
        let app = TeamStub::with_default_template("analytics-team").router();

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["team"], "analytics-team");
    }
}
