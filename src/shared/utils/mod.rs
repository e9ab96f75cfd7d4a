//! 工具函数模块

use axum::http::HeaderMap;
use std::net::SocketAddr;

/// 生成带前缀的唯一标识
pub fn generate_id(prefix: &str) -> String {
    format!("{}_{}", prefix, uuid::Uuid::new_v4().simple())
}

/// 解析逗号分隔的列表，忽略空项
pub fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// 客户端标识：默认取对端地址，`trust_proxy` 开启时取 `X-Forwarded-For` 的第一跳
pub fn client_identity(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy: bool) -> String {
    let forwarded = if trust_proxy {
        headers
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    } else {
        None
    };

    forwarded
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// 格式化持续时间
pub fn format_duration_ms(milliseconds: u64) -> String {
    if milliseconds < 1000 {
        format!("{}ms", milliseconds)
    } else if milliseconds < 60_000 {
        let seconds = milliseconds as f64 / 1000.0;
        format!("{:.1}s", seconds)
    } else {
        let minutes = milliseconds / 60_000;
        let seconds = (milliseconds % 60_000) / 1000;
        format!("{}m{}s", minutes, seconds)
    }
}
