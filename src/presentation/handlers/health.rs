//! 健康检查处理器
//! 
//! 网关自身存活检查和全部后端的健康快照

use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::business::domain::{HealthRecord, LifecycleState};
use crate::business::services::health_monitor::overall_status;
use crate::business::services::StatsSnapshot;
use crate::business::GatewayContext;
use crate::shared::AppResult;

/// 状态查询参数
#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    /// 为 true 时返回最近一轮巡检的缓存结果，不发起新的检查
    pub cached: Option<bool>,
}

/// 网关状态响应
#[derive(Debug, Serialize)]
pub struct GatewayStatusResponse {
    pub gateway: GatewayInfo,
    pub overall_status: String,
    pub services: Vec<HealthRecord>,
    pub stats: StatsSnapshot,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct GatewayInfo {
    pub running: bool,
    pub state: LifecycleState,
    pub uptime_seconds: u64,
}

/// 基础健康检查：回显服务地址映射和运行时长
#[instrument(skip(context))]
pub async fn health_check(State(context): State<GatewayContext>) -> Json<serde_json::Value> {
    info!("🏥 基础健康检查请求");

    Json(serde_json::json!({
        "status": "ok",
        "service": "unified-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": context.dispatcher.uptime_seconds(),
        "services": context.registry.address_map(),
    }))
}

/// 全部后端服务的健康快照
#[instrument(skip(context))]
pub async fn gateway_status(
    State(context): State<GatewayContext>,
    Query(query): Query<StatusQuery>,
) -> AppResult<Json<GatewayStatusResponse>> {
    let records = if query.cached.unwrap_or(false) {
        context.health.snapshot().await
    } else {
        context.health.sweep().await
    };
    info!("🏥 网关状态请求: {} 个服务", records.len());

    let state = context.lifecycle_state().await;

    Ok(Json(GatewayStatusResponse {
        gateway: GatewayInfo {
            running: state == LifecycleState::Running,
            state,
            uptime_seconds: context.dispatcher.uptime_seconds(),
        },
        overall_status: overall_status(&records).to_string(),
        services: records,
        stats: context.stats.snapshot(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    }))
}
