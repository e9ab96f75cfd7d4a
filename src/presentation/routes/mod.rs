//! 路由配置模块
//!
//! 组织所有HTTP路由，并在最外层套上前门中间件管道

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::business::GatewayContext;
use crate::presentation::handlers::{health, proxy, unified};
use crate::presentation::middleware::{
    access_log_middleware, body_limit_middleware, cors_layer, rate_limit_middleware, security_headers,
};

/// 应用状态
pub type AppState = GatewayContext;

/// 创建应用路由
pub fn create_routes(context: AppState) -> Router {
    // 公开路由
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/status", get(health::gateway_status));

    // 统一端点（精确路径），素材路径上的其它方法仍交给代理
    let unified_routes = Router::new()
        .route("/api/llm/generate", post(unified::generate_text))
        .route("/api/images/generate", post(unified::generate_image))
        .route("/api/workflows/execute", post(unified::execute_workflow))
        .route("/api/chat", post(unified::chat))
        .route(
            "/api/assets/branding",
            post(unified::generate_branding_assets).fallback(proxy::forward_request),
        )
        .route(
            "/api/assets/marketing",
            post(unified::generate_marketing_assets).fallback(proxy::forward_request),
        )
        .route(
            "/api/assets/mobile",
            post(unified::generate_mobile_assets).fallback(proxy::forward_request),
        )
        .route("/api/teams", get(unified::list_teams))
        .route("/api/teams/:team_id/execute", post(unified::execute_team_task))
        .route("/api/metrics/unified", get(unified::unified_metrics));

    let [h1, h2, h3, h4, h5] = security_headers();

    // 前门管道，自外向内：安全头 -> CORS -> 请求体限制 -> 限流 -> 访问日志
    let front_door = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::if_not_present(h1.0, h1.1))
        .layer(SetResponseHeaderLayer::if_not_present(h2.0, h2.1))
        .layer(SetResponseHeaderLayer::if_not_present(h3.0, h3.1))
        .layer(SetResponseHeaderLayer::if_not_present(h4.0, h4.1))
        .layer(SetResponseHeaderLayer::if_not_present(h5.0, h5.1))
        .layer(cors_layer(&context.config.cors))
        .layer(DefaultBodyLimit::max(context.config.max_body_bytes))
        .layer(middleware::from_fn_with_state(context.clone(), body_limit_middleware))
        .layer(middleware::from_fn_with_state(context.clone(), rate_limit_middleware))
        .layer(middleware::from_fn_with_state(context.clone(), access_log_middleware));

    Router::new()
        .merge(public_routes)
        .merge(unified_routes)
        // 其余路径按代理规则表前缀匹配
        .fallback(proxy::forward_request)
        .layer(front_door)
        .with_state(context)
}
