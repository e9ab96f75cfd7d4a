//! 素材生成接口
//!
//! 图片生成和素材目录的具体算法不在网关内，网关只依赖这个接口

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;

use crate::business::services::backend_client::BackendClient;
use crate::shared::constants::{backend_paths, services};
use crate::shared::AppResult;

/// 素材目录类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetCategory {
    Branding,
    Marketing,
    Mobile,
}

impl AssetCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetCategory::Branding => "branding",
            AssetCategory::Marketing => "marketing",
            AssetCategory::Mobile => "mobile",
        }
    }

    pub fn all() -> [AssetCategory; 3] {
        [AssetCategory::Branding, AssetCategory::Marketing, AssetCategory::Mobile]
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 图片生成请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSpec {
    pub prompt: String,
    pub style: Option<String>,
    pub category: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// 素材生成接口
#[async_trait]
pub trait AssetStudio: Send + Sync {
    /// 生成单张图片，返回生成结果（至少应包含 `url`）
    async fn generate_image(&self, spec: &ImageSpec) -> AppResult<Value>;

    /// 生成某一类别的素材目录
    async fn generate_catalog(&self, category: AssetCategory, requirements: &Value) -> AppResult<Value>;
}

/// 默认实现：调用注册表中的素材生成服务
pub struct RemoteAssetStudio {
    backend: BackendClient,
}

impl RemoteAssetStudio {
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl AssetStudio for RemoteAssetStudio {
    async fn generate_image(&self, spec: &ImageSpec) -> AppResult<Value> {
        let body = serde_json::to_value(spec).unwrap_or_else(|_| json!({ "prompt": spec.prompt }));
        self.backend
            .post_json(services::ASSET_GENERATOR, backend_paths::IMAGE_GENERATE, &body)
            .await
    }

    async fn generate_catalog(&self, category: AssetCategory, requirements: &Value) -> AppResult<Value> {
        let path = format!("{}/{}", backend_paths::ASSET_CATALOG, category);
        self.backend
            .post_json(
                services::ASSET_GENERATOR,
                &path,
                &json!({ "requirements": requirements }),
            )
            .await
    }
}

pub type SharedAssetStudio = Arc<dyn AssetStudio>;
