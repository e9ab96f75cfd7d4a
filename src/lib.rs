//! Unified Gateway 服务
//!
//! 多个后端服务前面的统一前门：注册表、健康巡检、反向代理和统一端点，基于三层架构设计

// 核心模块
pub mod shared;          // 共享模块（错误处理、常量、工具函数）
pub mod infrastructure;  // 基础设施层（配置、HTTP客户端）
pub mod business;        // 业务逻辑层（领域模型、注册表、巡检、代理、统一调度）
pub mod presentation;    // 表示层（HTTP处理、路由、中间件）
pub mod server;          // 生命周期

// 重新导出核心类型
pub use business::GatewayContext;
pub use infrastructure::Config;
pub use presentation::routes::create_routes;
pub use server::Gateway;
pub use shared::{AppError, AppResult};
