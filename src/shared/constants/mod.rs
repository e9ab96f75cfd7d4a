//! 常量定义模块

/// 服务注册表中的逻辑服务名
pub mod services {
    pub const FALLBACK: &str = "fallback";
    pub const ORCHESTRATOR: &str = "silhouette";
    pub const ASSET_GENERATOR: &str = "assets";
    pub const PROTOCOL_BRIDGE: &str = "mcp";
    pub const CONTEXT: &str = "context";
}

/// 后端服务暴露的接口路径
pub mod backend_paths {
    pub const HEALTH: &str = "/health";
    pub const FALLBACK_GENERATE: &str = "/api/generate";
    pub const WORKFLOW_EXECUTE: &str = "/api/workflows/execute";
    pub const TEAMS: &str = "/api/teams";
    pub const CHAT: &str = "/api/chat";
    pub const IMAGE_GENERATE: &str = "/api/images/generate";
    pub const ASSET_CATALOG: &str = "/api/assets";
}

/// 健康检查相关常量
pub mod health {
    pub const CHECK_TIMEOUT_MS: u64 = 1000;
    pub const SWEEP_INTERVAL_SECONDS: u64 = 30;
}

/// 速率限制相关常量
pub mod rate_limit {
    pub const DEFAULT_MAX_REQUESTS: u32 = 1000;
    pub const DEFAULT_WINDOW_SECONDS: i64 = 15 * 60; // 15分钟
}

/// HTTP相关常量
pub mod http {
    pub const DEFAULT_UPSTREAM_TIMEOUT_SECONDS: u64 = 300;
    pub const DEFAULT_CONNECT_TIMEOUT_SECONDS: u64 = 10;
    pub const MAX_REQUEST_SIZE_BYTES: usize = 50 * 1024 * 1024; // 50MB
}
