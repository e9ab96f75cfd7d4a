//! 网关上下文
//!
//! 注册表、统计、健康快照等共享状态的显式载体，传给每个处理器

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::info;

use crate::business::domain::LifecycleState;
use crate::business::services::{
    asset_studio::{RemoteAssetStudio, SharedAssetStudio},
    backend_client::BackendClient,
    dispatcher::{SharedUnifiedDispatcher, UnifiedDispatcher},
    health_monitor::{HealthMonitor, SharedHealthMonitor},
    proxy_router::{ProxyRouter, SharedProxyRouter},
    rate_limit_service::{RateLimitService, SharedRateLimitService},
    registry::{ServiceRegistry, SharedServiceRegistry},
    stats::{GatewayStats, SharedGatewayStats},
};
use crate::infrastructure::{Config, HttpClientFactory};
use crate::shared::AppResult;

/// 网关共享上下文
#[derive(Clone)]
pub struct GatewayContext {
    pub config: Arc<Config>,
    pub registry: SharedServiceRegistry,
    pub stats: SharedGatewayStats,
    pub health: SharedHealthMonitor,
    pub proxy: SharedProxyRouter,
    pub dispatcher: SharedUnifiedDispatcher,
    pub rate_limiter: SharedRateLimitService,
    pub lifecycle: Arc<RwLock<LifecycleState>>,
}

impl GatewayContext {
    /// 使用默认的远程素材生成实现构建上下文
    pub fn build(config: Config) -> AppResult<Self> {
        Self::build_with_assets(config, None)
    }

    /// 构建上下文，可注入自定义的素材生成实现
    pub fn build_with_assets(config: Config, assets: Option<SharedAssetStudio>) -> AppResult<Self> {
        let registry: SharedServiceRegistry = Arc::new(ServiceRegistry::new(config.services.clone())?);

        let upstream_client = HttpClientFactory::create_upstream_client(&config.upstream)?;
        let health_timeout = Duration::from_millis(config.health.timeout_ms);
        let health_client = HttpClientFactory::create_health_client(health_timeout)?;

        let stats: SharedGatewayStats = Arc::new(GatewayStats::new());
        let health: SharedHealthMonitor =
            Arc::new(HealthMonitor::new(registry.clone(), health_client, health_timeout));
        let proxy: SharedProxyRouter = Arc::new(ProxyRouter::new(
            registry.proxy_rules(),
            upstream_client.clone(),
            config.max_body_bytes,
        ));

        let backend = BackendClient::new(registry.clone(), upstream_client);
        let assets = assets.unwrap_or_else(|| Arc::new(RemoteAssetStudio::new(backend.clone())));
        let dispatcher: SharedUnifiedDispatcher = Arc::new(UnifiedDispatcher::new(
            backend,
            assets,
            stats.clone(),
            health.clone(),
            config.teams.clone(),
        ));

        let rate_limiter: SharedRateLimitService = Arc::new(RateLimitService::new(&config.rate_limit));

        info!("✅ 网关上下文初始化完成: {} 个后端服务", registry.len());

        Ok(Self {
            config: Arc::new(config),
            registry,
            stats,
            health,
            proxy,
            dispatcher,
            rate_limiter,
            lifecycle: Arc::new(RwLock::new(LifecycleState::Stopped)),
        })
    }

    pub async fn lifecycle_state(&self) -> LifecycleState {
        *self.lifecycle.read().await
    }
}
