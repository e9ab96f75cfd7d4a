//! 业务逻辑层模块
//! 
//! 包含领域模型、网关上下文和核心服务

pub mod domain;
pub mod context;
pub mod services;

// 重新导出常用类型
pub use context::GatewayContext;
pub use domain::*;
pub use services::*;
