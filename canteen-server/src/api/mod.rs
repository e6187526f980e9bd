//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`auth`] - 注册 / 登录
//! - [`products`] - 商品目录和供应商商品管理
//! - [`orders`] - 下单、订单历史、取餐状态

pub mod auth;
pub mod health;
pub mod orders;
pub mod products;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        // Auth API - public routes
        .merge(auth::router())
        // Catalog + provider product management
        .merge(products::router())
        // Order placement and history
        .merge(orders::router())
        // Health API - public route
        .merge(health::router())
}

/// Build a fully configured application with middleware and state
///
/// Used by both the HTTP server and the integration tests.
pub fn build_app(state: &ServerState) -> Router {
    build_router()
        // CORS - the SPA is served from a different origin
        .layer(CorsLayer::permissive())
        // Trace - request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone())
}
