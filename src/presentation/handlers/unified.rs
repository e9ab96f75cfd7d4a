//! 统一端点处理器
//! 
//! 请求体的提取和校验结果原样交给调度器，计数和错误翻译都在调度器内完成

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde_json::Value;
use tracing::{info, instrument};

use crate::business::services::{AssetCategory, ImageSpec};
use crate::business::GatewayContext;
use crate::presentation::dto::{
    validated_body, AssetCatalogRequest, BodyResult, ChatRequest, ExecuteWorkflowRequest,
    GenerateTextRequest, TeamTaskRequest,
};
use crate::shared::AppResult;

/// 文本生成
#[instrument(skip(context, body))]
pub async fn generate_text(State(context): State<GatewayContext>, body: BodyResult) -> AppResult<Json<Value>> {
    let input = validated_body::<GenerateTextRequest>(body).map(|(request, raw)| {
        info!(
            "🧠 文本生成请求: provider {:?}, model {:?}",
            request.provider, request.model
        );
        raw
    });

    context.dispatcher.generate_text(input).await.map(Json)
}

/// 图片生成
#[instrument(skip(context, body))]
pub async fn generate_image(State(context): State<GatewayContext>, body: BodyResult) -> AppResult<Json<Value>> {
    let input = validated_body::<ImageSpec>(body).map(|(spec, _)| {
        info!("🎨 图片生成请求: style {:?}, category {:?}", spec.style, spec.category);
        spec
    });

    context.dispatcher.generate_image(input).await.map(Json)
}

/// 工作流执行
#[instrument(skip(context, body))]
pub async fn execute_workflow(State(context): State<GatewayContext>, body: BodyResult) -> AppResult<Json<Value>> {
    let input = validated_body::<ExecuteWorkflowRequest>(body).map(|(request, raw)| {
        info!("⚙️ 工作流执行请求: {}, 优先级 {:?}", request.workflow, request.priority);
        raw
    });

    context.dispatcher.execute_workflow(input).await.map(Json)
}

/// 团队列表
#[instrument(skip(context))]
pub async fn list_teams(State(context): State<GatewayContext>) -> AppResult<Json<Value>> {
    context.dispatcher.list_teams().await.map(Json)
}

/// 团队任务执行
#[instrument(skip(context, body))]
pub async fn execute_team_task(
    State(context): State<GatewayContext>,
    Path(team_id): Path<String>,
    body: BodyResult,
) -> AppResult<Json<Value>> {
    let input = validated_body::<TeamTaskRequest>(body).map(|(request, raw)| {
        info!("📋 团队任务请求: {} -> {}", team_id, request.task);
        raw
    });

    context.dispatcher.execute_team_task(&team_id, input).await.map(Json)
}

/// 聊天
#[instrument(skip(context, body))]
pub async fn chat(State(context): State<GatewayContext>, body: BodyResult) -> AppResult<Json<Value>> {
    let input = validated_body::<ChatRequest>(body).map(|(request, raw)| {
        info!("💬 聊天请求: stream {:?}", request.stream);
        raw
    });

    context.dispatcher.chat(input).await.map(Json)
}

pub async fn generate_branding_assets(
    State(context): State<GatewayContext>,
    body: BodyResult,
) -> AppResult<Json<Value>> {
    generate_assets(context, AssetCategory::Branding, body).await
}

pub async fn generate_marketing_assets(
    State(context): State<GatewayContext>,
    body: BodyResult,
) -> AppResult<Json<Value>> {
    generate_assets(context, AssetCategory::Marketing, body).await
}

pub async fn generate_mobile_assets(
    State(context): State<GatewayContext>,
    body: BodyResult,
) -> AppResult<Json<Value>> {
    generate_assets(context, AssetCategory::Mobile, body).await
}

async fn generate_assets(
    context: GatewayContext,
    category: AssetCategory,
    body: BodyResult,
) -> AppResult<Json<Value>> {
    info!("🖼️ 素材目录请求: {}", category);
    let input = validated_body::<AssetCatalogRequest>(body).map(|(request, _)| request.requirements);

    context
        .dispatcher
        .generate_assets(category, input)
        .await
        .map(Json)
}

/// 汇总指标
#[instrument(skip(context))]
pub async fn unified_metrics(State(context): State<GatewayContext>) -> AppResult<Json<Value>> {
    let rules = context.proxy.rules().len();
    context.dispatcher.unified_metrics(rules).await.map(Json)
}
