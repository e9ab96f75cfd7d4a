//! 网关统计计数器
//!
//! 进程级计数器，只增不减，重启后归零

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// 统计快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub requests: u64,
    pub responses: u64,
    pub errors: u64,
}

impl StatsSnapshot {
    /// 仍在处理中的请求数
    pub fn in_flight(&self) -> u64 {
        self.requests.saturating_sub(self.responses + self.errors)
    }
}

/// 网关统计收集器
///
/// 计数器都是原子操作，多线程运行时下无需额外加锁。
/// 请求计数总是先于结果计数递增，因此任何时刻观察到的
/// `responses + errors <= requests`。
#[derive(Debug, Default)]
pub struct GatewayStats {
    requests: AtomicU64,
    responses: AtomicU64,
    errors: AtomicU64,
}

impl GatewayStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_response(&self) {
        self.responses.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::SeqCst);
    }

    /// 获取统计快照
    pub fn snapshot(&self) -> StatsSnapshot {
        // 先读结果计数再读请求计数，保证快照内的不变式
        let responses = self.responses.load(Ordering::SeqCst);
        let errors = self.errors.load(Ordering::SeqCst);
        let requests = self.requests.load(Ordering::SeqCst);

        StatsSnapshot {
            requests,
            responses,
            errors,
        }
    }
}

pub type SharedGatewayStats = Arc<GatewayStats>;
