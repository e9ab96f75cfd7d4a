use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::business::domain::ServiceDescriptor;
use crate::shared::constants::{health, http, rate_limit, services};
use crate::shared::utils::split_csv;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub services: Vec<ServiceDescriptor>,
    pub cors: CorsConfig,
    pub upstream: UpstreamConfig,
    pub health: HealthConfig,
    pub rate_limit: RateLimitConfig,
    pub max_body_bytes: usize,
    pub teams: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    /// 网关位于受信任的反向代理之后时，才用 `X-Forwarded-For` 识别客户端
    pub trust_proxy: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

/// 代理转发和统一端点调用共用的上游超时
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    pub timeout_seconds: u64,
    pub connect_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    pub interval_seconds: u64,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_seconds: i64,
}

/// 后端服务默认地址：(服务名, 环境变量前缀, 默认端口)
const SERVICE_DEFAULTS: [(&str, &str, u16); 5] = [
    (services::FALLBACK, "FALLBACK", 3001),
    (services::ORCHESTRATOR, "SILHOUETTE", 3002),
    (services::ASSET_GENERATOR, "ASSETS", 3003),
    (services::PROTOCOL_BRIDGE, "MCP", 3004),
    (services::CONTEXT, "CONTEXT", 3005),
];

const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:8080";

const DEFAULT_TEAMS: &str = "communications-team,development-team,design-team,marketing-team,analytics-team";

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        // 从环境变量加载配置
        dotenv::dotenv().ok();

        Ok(Self::from_lookup(|key| env::var(key).ok()))
    }

    /// 通过任意键值来源构建配置，缺失或无法解析的值使用默认值
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let services = SERVICE_DEFAULTS
            .iter()
            .map(|(name, prefix, port)| ServiceDescriptor {
                name: name.to_string(),
                host: value_or(&format!("{}_HOST", prefix), "localhost"),
                port: parse_or(lookup(&format!("{}_PORT", prefix)), *port),
            })
            .collect();

        Config {
            server: ServerConfig {
                port: parse_or(lookup("GATEWAY_PORT"), 8080),
                host: value_or("GATEWAY_HOST", "0.0.0.0"),
                trust_proxy: parse_or(lookup("TRUST_PROXY"), false),
            },

            services,

            cors: CorsConfig {
                allowed_origins: split_csv(&value_or("ALLOWED_ORIGINS", DEFAULT_ALLOWED_ORIGINS)),
            },

            upstream: UpstreamConfig {
                timeout_seconds: parse_or(
                    lookup("UPSTREAM_TIMEOUT_SECONDS"),
                    http::DEFAULT_UPSTREAM_TIMEOUT_SECONDS,
                ),
                connect_timeout_seconds: parse_or(
                    lookup("UPSTREAM_CONNECT_TIMEOUT_SECONDS"),
                    http::DEFAULT_CONNECT_TIMEOUT_SECONDS,
                ),
            },

            health: HealthConfig {
                interval_seconds: parse_or(
                    lookup("HEALTH_CHECK_INTERVAL_SECONDS"),
                    health::SWEEP_INTERVAL_SECONDS,
                ),
                timeout_ms: parse_or(lookup("HEALTH_CHECK_TIMEOUT_MS"), health::CHECK_TIMEOUT_MS),
            },

            rate_limit: RateLimitConfig {
                max_requests: parse_or(lookup("RATE_LIMIT_MAX_REQUESTS"), rate_limit::DEFAULT_MAX_REQUESTS),
                window_seconds: parse_or(
                    lookup("RATE_LIMIT_WINDOW_SECONDS"),
                    rate_limit::DEFAULT_WINDOW_SECONDS,
                ),
            },

            max_body_bytes: parse_or(lookup("MAX_BODY_BYTES"), http::MAX_REQUEST_SIZE_BYTES),

            teams: split_csv(&value_or("TEAMS", DEFAULT_TEAMS)),
        }
    }

    /// 监听地址
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 替换某个服务的地址（测试和嵌入场景使用）
    pub fn with_service(mut self, name: &str, host: &str, port: u16) -> Self {
        match self.services.iter_mut().find(|service| service.name == name) {
            Some(service) => {
                service.host = host.to_string();
                service.port = port;
            }
            None => self.services.push(ServiceDescriptor {
                name: name.to_string(),
                host: host.to_string(),
                port,
            }),
        }
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|value| value.trim().parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.server.port, 8080);
        assert!(!config.server.trust_proxy);
        assert_eq!(config.services.len(), 5);
        assert_eq!(config.rate_limit.max_requests, 1000);
        assert_eq!(config.rate_limit.window_seconds, 900);
        assert_eq!(config.health.timeout_ms, 1000);
        assert_eq!(config.health.interval_seconds, 30);
        assert_eq!(config.max_body_bytes, 50 * 1024 * 1024);
        assert_eq!(config.cors.allowed_origins.len(), 2);

        let fallback = config.services.iter().find(|s| s.name == "fallback").unwrap();
        assert_eq!(fallback.host, "localhost");
        assert_eq!(fallback.port, 3001);
    }

    #[test]
    fn test_overrides_and_invalid_values() {
        let vars: HashMap<&str, &str> = [
            ("GATEWAY_PORT", "9000"),
            ("FALLBACK_HOST", "fallback.internal"),
            ("FALLBACK_PORT", "not-a-port"),
            ("ALLOWED_ORIGINS", "https://app.example.com"),
            ("TRUST_PROXY", "true"),
        ]
        .into_iter()
        .collect();

        let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.server.port, 9000);
        assert!(config.server.trust_proxy);
        let fallback = config.services.iter().find(|s| s.name == "fallback").unwrap();
        assert_eq!(fallback.host, "fallback.internal");
        assert_eq!(fallback.port, 3001);
        assert_eq!(config.cors.allowed_origins, vec!["https://app.example.com".to_string()]);
    }

    #[test]
    fn test_with_service_replaces_address() {
        let config = Config::default().with_service("mcp", "127.0.0.1", 4100);
        let mcp = config.services.iter().find(|s| s.name == "mcp").unwrap();

        assert_eq!(mcp.host, "127.0.0.1");
        assert_eq!(mcp.port, 4100);
        assert_eq!(config.services.len(), 5);
    }
}
