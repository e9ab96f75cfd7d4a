//! 基础设施层模块
//! 
//! 负责配置管理和对外HTTP调用等基础设施相关功能

pub mod config;
pub mod http_client;

// 重新导出常用类型
pub use config::Config;
pub use http_client::HttpClientFactory;
