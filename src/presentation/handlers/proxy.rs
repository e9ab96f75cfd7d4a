//! 反向代理处理器
//! 
//! 所有未被精确路由命中的请求都交给代理规则表处理

use axum::{
    extract::{ConnectInfo, Request, State},
    response::Response,
};
use std::net::SocketAddr;

use crate::business::GatewayContext;
use crate::shared::AppResult;

/// 透明转发到前缀匹配的后端
pub async fn forward_request(
    State(context): State<GatewayContext>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
) -> AppResult<Response> {
    let client_addr = connect_info.map(|ConnectInfo(addr)| addr);
    context.proxy.forward(request, client_addr).await
}
