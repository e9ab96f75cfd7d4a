//! 统一端点调度器
//!
//! 实现跨服务的组合操作。所有操作都经过同一个包装：
//! 入口计一次请求，出口要么计一次响应、要么计一次错误；
//! 下游错误只记录日志，对外返回固定的提示信息。
//! 请求体校验结果作为入参传入，校验失败同样在包装内计数

use chrono::Utc;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use crate::business::services::asset_studio::{AssetCategory, ImageSpec, SharedAssetStudio};
use crate::business::services::backend_client::BackendClient;
use crate::business::services::health_monitor::{overall_status, SharedHealthMonitor};
use crate::business::services::stats::SharedGatewayStats;
use crate::shared::constants::{backend_paths, services};
use crate::shared::utils::generate_id;
use crate::shared::{AppError, AppResult};

/// 统一端点操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    GenerateText,
    GenerateImage,
    ExecuteWorkflow,
    ListTeams,
    ExecuteTeamTask,
    UnifiedMetrics,
    Chat,
    GenerateAssets(AssetCategory),
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::GenerateText => "generate_text",
            Operation::GenerateImage => "generate_image",
            Operation::ExecuteWorkflow => "execute_workflow",
            Operation::ListTeams => "list_teams",
            Operation::ExecuteTeamTask => "execute_team_task",
            Operation::UnifiedMetrics => "unified_metrics",
            Operation::Chat => "chat",
            Operation::GenerateAssets(AssetCategory::Branding) => "generate_branding_assets",
            Operation::GenerateAssets(AssetCategory::Marketing) => "generate_marketing_assets",
            Operation::GenerateAssets(AssetCategory::Mobile) => "generate_mobile_assets",
        }
    }

    /// 对客户端暴露的固定错误信息
    pub fn failure_message(&self) -> &'static str {
        match self {
            Operation::GenerateText => "LLM generation failed",
            Operation::GenerateImage => "Image generation failed",
            Operation::ExecuteWorkflow => "Workflow execution failed",
            Operation::ListTeams => "Failed to list teams",
            Operation::ExecuteTeamTask => "Team execution failed",
            Operation::UnifiedMetrics => "Failed to collect metrics",
            Operation::Chat => "Chat failed",
            Operation::GenerateAssets(AssetCategory::Branding) => "Branding asset generation failed",
            Operation::GenerateAssets(AssetCategory::Marketing) => "Marketing asset generation failed",
            Operation::GenerateAssets(AssetCategory::Mobile) => "Mobile asset generation failed",
        }
    }
}

/// 统一端点调度器
pub struct UnifiedDispatcher {
    backend: BackendClient,
    assets: SharedAssetStudio,
    stats: SharedGatewayStats,
    health: SharedHealthMonitor,
    teams: Vec<String>,
    started_at: Instant,
}

impl UnifiedDispatcher {
    pub fn new(
        backend: BackendClient,
        assets: SharedAssetStudio,
        stats: SharedGatewayStats,
        health: SharedHealthMonitor,
        teams: Vec<String>,
    ) -> Self {
        Self {
            backend,
            assets,
            stats,
            health,
            teams,
            started_at: Instant::now(),
        }
    }

    /// 操作包装：负责计数和日志，把下游错误翻译成固定提示
    ///
    /// 客户端错误（4xx）原样返回，只有服务端和下游错误被替换
    pub async fn run<T, F>(&self, operation: Operation, call: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        self.stats.record_request();
        let started = Instant::now();

        match call.await {
            Ok(value) => {
                self.stats.record_response();
                info!(
                    operation = operation.name(),
                    latency_ms = started.elapsed().as_millis() as u64,
                    "✅ 统一端点完成"
                );
                Ok(value)
            }
            Err(e) => {
                self.stats.record_error();
                error!(
                    operation = operation.name(),
                    latency_ms = started.elapsed().as_millis() as u64,
                    transport = e.is_transport_failure(),
                    error = %e,
                    "❌ 统一端点失败"
                );
                if e.status_code().is_client_error() {
                    Err(e)
                } else {
                    Err(AppError::OperationFailed(operation.failure_message().to_string()))
                }
            }
        }
    }

    /// 文本生成：转发到回退服务，成功时原样返回后端结果
    pub async fn generate_text(&self, input: AppResult<Value>) -> AppResult<Value> {
        self.run(Operation::GenerateText, async {
            let body = input?;
            self.backend
                .post_json(services::FALLBACK, backend_paths::FALLBACK_GENERATE, &body)
                .await
        })
        .await
    }

    /// 图片生成：调用素材生成接口并包装成统一信封
    pub async fn generate_image(&self, input: AppResult<ImageSpec>) -> AppResult<Value> {
        self.run(Operation::GenerateImage, async {
            let spec = input?;
            let result = self.assets.generate_image(&spec).await?;
            Ok(image_envelope(&spec, result))
        })
        .await
    }

    pub async fn execute_workflow(&self, input: AppResult<Value>) -> AppResult<Value> {
        self.run(Operation::ExecuteWorkflow, async {
            let body = input?;
            self.backend
                .post_json(services::ORCHESTRATOR, backend_paths::WORKFLOW_EXECUTE, &body)
                .await
        })
        .await
    }

    pub async fn list_teams(&self) -> AppResult<Value> {
        self.run(Operation::ListTeams, async {
            self.backend.get_json(services::ORCHESTRATOR, backend_paths::TEAMS).await
        })
        .await
    }

    /// 团队任务：团队标识只能作为单个路径段拼进后端地址
    pub async fn execute_team_task(&self, team_id: &str, input: AppResult<Value>) -> AppResult<Value> {
        self.run(Operation::ExecuteTeamTask, async {
            validate_team_id(team_id)?;
            let body = input?;
            let path = format!("{}/{}/execute", backend_paths::TEAMS, team_id);
            self.backend.post_json(services::ORCHESTRATOR, &path, &body).await
        })
        .await
    }

    pub async fn chat(&self, input: AppResult<Value>) -> AppResult<Value> {
        self.run(Operation::Chat, async {
            let body = input?;
            self.backend
                .post_json(services::PROTOCOL_BRIDGE, backend_paths::CHAT, &body)
                .await
        })
        .await
    }

    pub async fn generate_assets(&self, category: AssetCategory, input: AppResult<Value>) -> AppResult<Value> {
        self.run(Operation::GenerateAssets(category), async {
            let requirements = input?;
            let catalog = self.assets.generate_catalog(category, &requirements).await?;
            Ok(json!({
                "category": category,
                "assets": catalog,
                "generated_at": Utc::now().to_rfc3339(),
            }))
        })
        .await
    }

    /// 汇总指标：网关计数、一轮完整健康巡检和静态的后端指标
    ///
    /// 即使部分后端不可达，各部分字段也都会出现
    pub async fn unified_metrics(&self, proxy_rules: usize) -> AppResult<Value> {
        self.run(Operation::UnifiedMetrics, async {
            let records = self.health.sweep().await;
            let stats = self.stats.snapshot();

            Ok(json!({
                "timestamp": Utc::now().to_rfc3339(),
                "gateway": {
                    "requests": stats.requests,
                    "responses": stats.responses,
                    "errors": stats.errors,
                    "in_flight": stats.in_flight(),
                    "uptime_seconds": self.started_at.elapsed().as_secs(),
                },
                "overall_status": overall_status(&records),
                "services": records,
                "backends": self.static_backend_metrics(proxy_rules),
            }))
        })
        .await
    }

    fn static_backend_metrics(&self, proxy_rules: usize) -> Value {
        json!({
            "orchestrator": {
                "registered_teams": self.teams.len(),
                "teams": self.teams,
            },
            "assets": {
                "categories": AssetCategory::all(),
            },
            "proxy": {
                "rules": proxy_rules,
            },
        })
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

/// 团队标识只允许字母、数字、`-`、`_`、`.`，且不能是 `.` 或 `..`
fn validate_team_id(team_id: &str) -> AppResult<()> {
    let allowed = team_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if team_id.is_empty() || !allowed || team_id == "." || team_id == ".." {
        return Err(crate::validation_error!("invalid team id: {:?}", team_id));
    }
    Ok(())
}

/// 图片生成结果信封，标识和时间戳由网关生成
fn image_envelope(spec: &ImageSpec, result: Value) -> Value {
    let id = generate_id("img");
    let url = result
        .get("url")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("/generated/images/{}.png", id));

    json!({
        "id": id,
        "url": url,
        "prompt": spec.prompt,
        "style": spec.style.as_deref().unwrap_or("default"),
        "category": spec.category.as_deref().unwrap_or("general"),
        "metadata": {
            "generated_at": Utc::now().to_rfc3339(),
            "options": spec.extra,
            "generator": result,
        },
    })
}

pub type SharedUnifiedDispatcher = Arc<UnifiedDispatcher>;
