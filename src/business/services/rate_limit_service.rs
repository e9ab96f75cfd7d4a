use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use chrono::{DateTime, Utc, Duration};
use tracing::{debug, info, warn};

use crate::infrastructure::config::RateLimitConfig;

/// 速率限制记录：窗口内已放行请求的时间戳，按时间先后排列
#[derive(Debug, Clone, Default)]
pub struct RateLimitRecord {
    pub hits: VecDeque<DateTime<Utc>>,
}

impl RateLimitRecord {
    /// 丢弃已滑出窗口的时间戳
    fn evict_expired(&mut self, now: DateTime<Utc>, window: Duration) {
        while let Some(oldest) = self.hits.front() {
            if now - *oldest >= window {
                self.hits.pop_front();
            } else {
                break;
            }
        }
    }
}

/// 速率限制结果
#[derive(Debug, PartialEq, Eq)]
pub enum RateLimitResult {
    Allowed { remaining: u32 },
    LimitExceeded { limit: u32, reset_in_seconds: i64 },
}

/// 速率限制服务
/// 每个客户端标识一个滑动窗口：任意一段窗口长度内放行的请求不超过上限
pub struct RateLimitService {
    max_requests: u32,
    window: Duration,
    // 客户端标识 -> 记录
    records: Arc<RwLock<HashMap<String, RateLimitRecord>>>,
}

impl RateLimitService {
    /// 创建新的速率限制服务
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            max_requests: config.max_requests,
            window: Duration::seconds(config.window_seconds),
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// 检查并更新速率限制
    pub async fn check_rate_limit(&self, identity: &str) -> RateLimitResult {
        self.check_rate_limit_at(identity, Utc::now()).await
    }

    /// 以指定时刻检查速率限制
    pub async fn check_rate_limit_at(&self, identity: &str, now: DateTime<Utc>) -> RateLimitResult {
        let mut records = self.records.write().await;
        let record = records.entry(identity.to_string()).or_default();
        record.evict_expired(now, self.window);

        let used = record.hits.len() as u32;
        if used >= self.max_requests {
            // 最早一次请求滑出窗口后才会有新的额度
            let reset_in_seconds = record
                .hits
                .front()
                .map(|oldest| (*oldest + self.window - now).num_seconds())
                .unwrap_or(0)
                .max(1);
            warn!("⚠️ 客户端 {} 触发限流: {}/{}", identity, used, self.max_requests);
            return RateLimitResult::LimitExceeded {
                limit: self.max_requests,
                reset_in_seconds,
            };
        }

        record.hits.push_back(now);
        debug!("✅ 客户端 {} 速率检查通过: {}/{}", identity, used + 1, self.max_requests);

        RateLimitResult::Allowed {
            remaining: self.max_requests - used - 1,
        }
    }

    /// 清理过期记录（定期调用）
    pub async fn cleanup_expired_records(&self) {
        let now = Utc::now();
        let window = self.window;

        let mut records = self.records.write().await;
        records.retain(|_, record| {
            record.evict_expired(now, window);
            !record.hits.is_empty()
        });

        info!("🧹 清理速率限制记录，当前记录数: {}", records.len());
    }

    /// 当前跟踪的客户端数量
    pub async fn tracked_clients(&self) -> usize {
        self.records.read().await.len()
    }
}

/// 全局速率限制服务实例
pub type SharedRateLimitService = Arc<RateLimitService>;

#[cfg(test)]
mod tests {
    use super::*;

    fn service(max_requests: u32) -> RateLimitService {
        RateLimitService::new(&RateLimitConfig {
            max_requests,
            window_seconds: 15 * 60,
        })
    }

    #[tokio::test]
    async fn test_rejects_after_limit_within_window() {
        let limiter = service(1000);
        let start = Utc::now();

        for i in 0..1000 {
            let at = start + Duration::milliseconds(i);
            assert!(matches!(
                limiter.check_rate_limit_at("10.0.0.1", at).await,
                RateLimitResult::Allowed { .. }
            ));
        }

        match limiter.check_rate_limit_at("10.0.0.1", start + Duration::minutes(10)).await {
            RateLimitResult::LimitExceeded { limit, reset_in_seconds } => {
                assert_eq!(limit, 1000);
                assert_eq!(reset_in_seconds, 5 * 60);
            }
            other => panic!("期望被限流, 实际: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_resumes_after_window_rolls_over() {
        let limiter = service(2);
        let start = Utc::now();

        limiter.check_rate_limit_at("client", start).await;
        limiter.check_rate_limit_at("client", start).await;
        assert!(matches!(
            limiter.check_rate_limit_at("client", start + Duration::minutes(14)).await,
            RateLimitResult::LimitExceeded { .. }
        ));

        assert_eq!(
            limiter.check_rate_limit_at("client", start + Duration::minutes(15)).await,
            RateLimitResult::Allowed { remaining: 1 }
        );
    }

    #[tokio::test]
    async fn test_budget_is_not_doubled_at_window_edge() {
        let limiter = service(1000);
        let start = Utc::now();
        let edge = start + Duration::seconds(899);

        // 窗口末尾用完额度
        for _ in 0..1000 {
            assert!(matches!(
                limiter.check_rate_limit_at("edge", edge).await,
                RateLimitResult::Allowed { .. }
            ));
        }

        // 跨过固定窗口边界后，这些请求仍在滑动窗口内
        let mut allowed = 0;
        for i in 0..1000 {
            let at = start + Duration::seconds(900) + Duration::milliseconds(i);
            if matches!(limiter.check_rate_limit_at("edge", at).await, RateLimitResult::Allowed { .. }) {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 0);

        match limiter.check_rate_limit_at("edge", start + Duration::seconds(1000)).await {
            RateLimitResult::LimitExceeded { reset_in_seconds, .. } => assert_eq!(reset_in_seconds, 799),
            other => panic!("期望被限流, 实际: {:?}", other),
        }

        // 最早的请求滑出窗口后恢复
        assert!(matches!(
            limiter.check_rate_limit_at("edge", edge + Duration::seconds(900)).await,
            RateLimitResult::Allowed { .. }
        ));
    }

    #[tokio::test]
    async fn test_identities_are_independent() {
        let limiter = service(1);
        let now = Utc::now();

        assert!(matches!(limiter.check_rate_limit_at("a", now).await, RateLimitResult::Allowed { .. }));
        assert!(matches!(limiter.check_rate_limit_at("a", now).await, RateLimitResult::LimitExceeded { .. }));
        assert!(matches!(limiter.check_rate_limit_at("b", now).await, RateLimitResult::Allowed { .. }));
    }

    #[tokio::test]
    async fn test_cleanup_drops_expired_windows() {
        let limiter = service(10);
        limiter.check_rate_limit_at("old", Utc::now() - Duration::hours(1)).await;
        limiter.check_rate_limit("fresh").await;
        assert_eq!(limiter.tracked_clients().await, 2);

        limiter.cleanup_expired_records().await;
        assert_eq!(limiter.tracked_clients().await, 1);
    }
}
