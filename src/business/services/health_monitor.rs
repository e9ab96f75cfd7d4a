//! 健康巡检服务
//!
//! 并发检查所有已注册服务的 `/health`，维护最近一轮的健康快照

use chrono::{DateTime, Utc};
use futures::future::join_all;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::business::domain::{HealthDetail, HealthRecord, ServiceDescriptor};
use crate::business::services::registry::SharedServiceRegistry;
use crate::shared::constants::backend_paths;
use crate::shared::utils::format_duration_ms;

/// 健康巡检器
pub struct HealthMonitor {
    registry: SharedServiceRegistry,
    client: Client,
    timeout: Duration,
    records: RwLock<HashMap<String, HealthRecord>>,
    last_sweep_at: RwLock<Option<DateTime<Utc>>>,
    sweeps: AtomicU64,
}

impl HealthMonitor {
    pub fn new(registry: SharedServiceRegistry, client: Client, timeout: Duration) -> Self {
        Self {
            registry,
            client,
            timeout,
            records: RwLock::new(HashMap::new()),
            last_sweep_at: RwLock::new(None),
            sweeps: AtomicU64::new(0),
        }
    }

    /// 检查单个服务，任何传输错误、超时或非2xx状态都判定为不健康
    pub async fn check_service(&self, service: &ServiceDescriptor) -> HealthRecord {
        let started = Instant::now();
        let result = self
            .client
            .get(service.url_for(backend_paths::HEALTH))
            .timeout(self.timeout)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                HealthRecord::healthy(&service.name, started.elapsed().as_millis() as u64)
            }
            Ok(response) => {
                HealthRecord::unhealthy(&service.name, format!("HTTP {}", response.status()))
            }
            Err(e) if e.is_timeout() => HealthRecord::unhealthy(
                &service.name,
                format!("timed out after {}", format_duration_ms(self.timeout.as_millis() as u64)),
            ),
            Err(e) => HealthRecord::unhealthy(&service.name, e.to_string()),
        }
    }

    /// 执行一轮巡检
    ///
    /// 各服务的检查并发进行，整轮耗时受单次超时约束，而不是各服务超时之和
    #[instrument(skip(self))]
    pub async fn sweep(&self) -> Vec<HealthRecord> {
        let checks = self
            .registry
            .services()
            .iter()
            .map(|service| self.check_service(service));
        let records = join_all(checks).await;

        {
            let mut cache = self.records.write().await;
            for record in &records {
                cache.insert(record.service_name.clone(), record.clone());
            }
        }
        *self.last_sweep_at.write().await = Some(Utc::now());
        self.sweeps.fetch_add(1, Ordering::SeqCst);

        records
    }

    /// 定时巡检：记录完整快照，从不向外抛出失败
    pub async fn run_scheduled_sweep(&self) {
        let records = self.sweep().await;
        let healthy = records.iter().filter(|record| record.is_healthy()).count();

        info!(
            "🏥 定时健康巡检完成: {}/{} 健康, 总体状态 {}",
            healthy,
            records.len(),
            overall_status(&records)
        );
        for record in &records {
            match &record.detail {
                HealthDetail::Latency { latency_ms } => info!(
                    service = %record.service_name,
                    status = record.status.as_str(),
                    latency_ms = *latency_ms,
                    "服务健康"
                ),
                HealthDetail::Error { message } => warn!(
                    service = %record.service_name,
                    status = record.status.as_str(),
                    error = %message,
                    "服务不健康"
                ),
            }
        }
    }

    /// 最近一轮的缓存快照，按注册顺序每个服务恰好一条
    pub async fn snapshot(&self) -> Vec<HealthRecord> {
        let cache = self.records.read().await;
        self.registry
            .services()
            .iter()
            .map(|service| {
                cache
                    .get(&service.name)
                    .cloned()
                    .unwrap_or_else(|| HealthRecord::unhealthy(&service.name, "not checked yet"))
            })
            .collect()
    }

    pub async fn last_sweep_at(&self) -> Option<DateTime<Utc>> {
        *self.last_sweep_at.read().await
    }

    /// 已完成的巡检轮数
    pub fn sweep_count(&self) -> u64 {
        self.sweeps.load(Ordering::SeqCst)
    }
}

/// 汇总整体状态：全部健康、部分健康、全部不健康
pub fn overall_status(records: &[HealthRecord]) -> &'static str {
    let healthy = records.iter().filter(|record| record.is_healthy()).count();

    if healthy == records.len() {
        "healthy"
    } else if healthy > 0 {
        "degraded"
    } else {
        "unhealthy"
    }
}

pub type SharedHealthMonitor = Arc<HealthMonitor>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::business::domain::HealthStatus;
    use crate::business::services::registry::ServiceRegistry;

    fn monitor_for(services: Vec<ServiceDescriptor>) -> HealthMonitor {
        let registry = Arc::new(ServiceRegistry::new(services).unwrap());
        HealthMonitor::new(registry, Client::new(), Duration::from_millis(300))
    }

    /// 获取一个当前无人监听的本地端口
    async fn closed_port() -> u16 {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    #[tokio::test]
    async fn test_unreachable_service_is_unhealthy() {
        let port = closed_port().await;
        let monitor = monitor_for(vec![ServiceDescriptor::new("fallback", "127.0.0.1", port)]);

        let records = monitor.sweep().await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, HealthStatus::Unhealthy);
        assert!(matches!(records[0].detail, HealthDetail::Error { .. }));
        assert_eq!(monitor.sweep_count(), 1);
        assert!(monitor.last_sweep_at().await.is_some());
    }

    #[tokio::test]
    async fn test_snapshot_has_one_record_per_service_before_first_sweep() {
        let monitor = monitor_for(vec![
            ServiceDescriptor::new("fallback", "127.0.0.1", 1),
            ServiceDescriptor::new("assets", "127.0.0.1", 2),
        ]);

        let snapshot = monitor.snapshot().await;
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].service_name, "fallback");
        assert_eq!(snapshot[1].service_name, "assets");
        assert!(snapshot.iter().all(|record| !record.is_healthy()));
    }

    #[test]
    fn test_overall_status() {
        let healthy = HealthRecord::healthy("a", 3);
        let unhealthy = HealthRecord::unhealthy("b", "down");

        assert_eq!(overall_status(&[healthy.clone()]), "healthy");
        assert_eq!(overall_status(&[healthy, unhealthy.clone()]), "degraded");
        assert_eq!(overall_status(&[unhealthy]), "unhealthy");
    }
}
