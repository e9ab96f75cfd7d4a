//! 业务服务模块
//! 
//! 实现网关的核心逻辑：注册表、统计、健康巡检、反向代理和统一端点

pub mod registry;
pub mod stats;
pub mod health_monitor;
pub mod rate_limit_service;
pub mod proxy_router;
pub mod backend_client;
pub mod asset_studio;
pub mod dispatcher;
pub mod team_stub;

pub use registry::{ServiceRegistry, SharedServiceRegistry};
pub use stats::{GatewayStats, SharedGatewayStats, StatsSnapshot};
pub use health_monitor::{HealthMonitor, SharedHealthMonitor};
pub use rate_limit_service::{RateLimitService, SharedRateLimitService, RateLimitResult};
pub use proxy_router::{ProxyRouter, SharedProxyRouter};
pub use backend_client::BackendClient;
pub use asset_studio::{AssetCategory, AssetStudio, ImageSpec, RemoteAssetStudio, SharedAssetStudio};
pub use dispatcher::{Operation, SharedUnifiedDispatcher, UnifiedDispatcher};
pub use team_stub::TeamStub;
