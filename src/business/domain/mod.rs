//! 领域模型模块
//!
//! 定义网关的核心实体和值对象

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 后端服务描述，进程生命周期内不可变
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub name: String,
    pub host: String,
    pub port: u16,
}

impl ServiceDescriptor {
    pub fn new(name: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port,
        }
    }

    /// 服务根地址，例如 `http://localhost:3001`
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// 拼接服务上的完整地址，`path_and_query` 必须以 `/` 开头
    pub fn url_for(&self, path_and_query: &str) -> String {
        format!("{}{}", self.base_url(), path_and_query)
    }
}

/// 健康状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Unhealthy => "unhealthy",
        }
    }
}

/// 健康检查细节：成功时为延迟，失败时为错误信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthDetail {
    Latency { latency_ms: u64 },
    Error { message: String },
}

/// 单个服务的健康记录，每轮巡检整体覆盖
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthRecord {
    pub service_name: String,
    pub status: HealthStatus,
    pub checked_at: DateTime<Utc>,
    pub detail: HealthDetail,
}

impl HealthRecord {
    pub fn healthy(service_name: &str, latency_ms: u64) -> Self {
        Self {
            service_name: service_name.to_string(),
            status: HealthStatus::Healthy,
            checked_at: Utc::now(),
            detail: HealthDetail::Latency { latency_ms },
        }
    }

    pub fn unhealthy(service_name: &str, message: impl Into<String>) -> Self {
        Self {
            service_name: service_name.to_string(),
            status: HealthStatus::Unhealthy,
            checked_at: Utc::now(),
            detail: HealthDetail::Error { message: message.into() },
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

/// 路径前缀代理规则
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRule {
    pub path_prefix: String,
    pub target: ServiceDescriptor,
    pub strip_prefix: String,
}

impl ProxyRule {
    /// 标准规则：`/api/<service>` 前缀被完整剥离
    pub fn for_service(target: ServiceDescriptor) -> Self {
        let prefix = format!("/api/{}", target.name);
        Self {
            path_prefix: prefix.clone(),
            target,
            strip_prefix: prefix,
        }
    }

    /// 仅在路径段边界上匹配：`/api/fallbackx` 不匹配 `/api/fallback`
    pub fn matches(&self, path: &str) -> bool {
        match path.strip_prefix(self.path_prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    /// 去掉前缀后的剩余路径，剩余为空时返回 `/`
    pub fn rewrite(&self, path: &str) -> String {
        let rest = path.strip_prefix(self.strip_prefix.as_str()).unwrap_or(path);
        if rest.is_empty() {
            "/".to_string()
        } else {
            rest.to_string()
        }
    }
}

/// 网关生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Stopped => "STOPPED",
            LifecycleState::Starting => "STARTING",
            LifecycleState::Running => "RUNNING",
            LifecycleState::Stopping => "STOPPING",
        };
        f.write_str(name)
    }
}
