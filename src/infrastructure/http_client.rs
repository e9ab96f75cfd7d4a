//! 上游HTTP客户端工厂
//! 
//! 根据上游配置创建带超时的HTTP客户端

use std::time::Duration;
use reqwest::Client;
use tracing::{error, info};

use crate::infrastructure::config::UpstreamConfig;
use crate::shared::{AppError, AppResult};

/// 上游HTTP客户端工厂
pub struct HttpClientFactory;

impl HttpClientFactory {
    /// 创建用于代理转发和统一端点的客户端
    ///
    /// 每个请求都有整体超时，不会无限期占用连接
    pub fn create_upstream_client(config: &UpstreamConfig) -> AppResult<Client> {
        info!(
            "🔗 创建上游HTTP客户端: 超时 {}s, 连接超时 {}s",
            config.timeout_seconds, config.connect_timeout_seconds
        );

        Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .pool_idle_timeout(Duration::from_secs(90)) // 连接池空闲超时
            .tcp_keepalive(Duration::from_secs(60))   // TCP保活
            .redirect(reqwest::redirect::Policy::none()) // 重定向原样交给客户端
            .build()
            .map_err(|e| {
                error!("❌ 创建HTTP客户端失败: {}", e);
                AppError::Configuration(format!("创建HTTP客户端失败: {}", e))
            })
    }

    /// 创建健康检查专用客户端，使用独立的短超时
    pub fn create_health_client(timeout: Duration) -> AppResult<Client> {
        Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| {
                error!("❌ 创建健康检查客户端失败: {}", e);
                AppError::Configuration(format!("创建健康检查客户端失败: {}", e))
            })
    }
}
