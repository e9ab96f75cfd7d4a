//! 服务注册表
//!
//! 逻辑服务名到网络地址的静态映射，启动后只读

use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::business::domain::{ProxyRule, ServiceDescriptor};
use crate::shared::{AppError, AppResult};

/// 服务注册表
#[derive(Debug)]
pub struct ServiceRegistry {
    // 保持注册顺序，健康快照按此顺序输出
    services: Vec<ServiceDescriptor>,
    index: HashMap<String, usize>,
}

impl ServiceRegistry {
    /// 从配置构建注册表，重复的服务名视为配置错误
    pub fn new(services: Vec<ServiceDescriptor>) -> AppResult<Self> {
        let mut index = HashMap::with_capacity(services.len());
        for (position, service) in services.iter().enumerate() {
            if service.name.is_empty() {
                return Err(AppError::Configuration("服务名不能为空".to_string()));
            }
            if index.insert(service.name.clone(), position).is_some() {
                return Err(AppError::Configuration(format!("服务名重复: {}", service.name)));
            }
            info!("📇 注册服务 {} -> {}", service.name, service.base_url());
        }

        Ok(Self { services, index })
    }

    /// 按逻辑名解析服务
    pub fn resolve(&self, name: &str) -> AppResult<&ServiceDescriptor> {
        self.index
            .get(name)
            .map(|position| &self.services[*position])
            .ok_or_else(|| AppError::UnknownService(name.to_string()))
    }

    /// 所有已注册服务（注册顺序）
    pub fn services(&self) -> &[ServiceDescriptor] {
        &self.services
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// 服务名到地址的映射，用于 `/health` 回显
    pub fn address_map(&self) -> HashMap<String, String> {
        self.services
            .iter()
            .map(|service| (service.name.clone(), service.base_url()))
            .collect()
    }

    /// 由注册表派生的静态代理规则表
    pub fn proxy_rules(&self) -> Vec<ProxyRule> {
        self.services.iter().cloned().map(ProxyRule::for_service).collect()
    }
}

pub type SharedServiceRegistry = Arc<ServiceRegistry>;

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ServiceRegistry {
        ServiceRegistry::new(vec![
            ServiceDescriptor::new("fallback", "localhost", 3001),
            ServiceDescriptor::new("silhouette", "orchestrator.local", 3002),
        ])
        .unwrap()
    }

    #[test]
    fn test_resolve_known_service() {
        let registry = registry();
        let service = registry.resolve("silhouette").unwrap();

        assert_eq!(service.host, "orchestrator.local");
        assert_eq!(service.port, 3002);
    }

    #[test]
    fn test_resolve_unknown_service() {
        let registry = registry();

        match registry.resolve("nope") {
            Err(AppError::UnknownService(name)) => assert_eq!(name, "nope"),
            other => panic!("期望 UnknownService, 实际: {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = ServiceRegistry::new(vec![
            ServiceDescriptor::new("fallback", "a", 1),
            ServiceDescriptor::new("fallback", "b", 2),
        ]);

        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[test]
    fn test_proxy_rules_follow_registry() {
        let rules = registry().proxy_rules();

        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].path_prefix, "/api/fallback");
        assert_eq!(rules[1].path_prefix, "/api/silhouette");
        assert_eq!(rules[1].target.port, 3002);
    }
}
