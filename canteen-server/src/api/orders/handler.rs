//! Order API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use shared::models::{Order, OrderDetail};
use shared::request::{CreateOrderRequest, UpdateOrderStatusRequest};
use shared::response::OrderConfirmation;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::OrderRepository;
use crate::utils::{AppError, AppResult};

/// POST /api/orders - 下单
///
/// 请求体: `{items: [{productId, quantity}], totalPrice}`。
/// 服务端按目录价重算总价; 客户端总价只作对账参考。
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<OrderConfirmation>)> {
    let repo = OrderRepository::new(state.pool().clone());
    let confirmation = repo
        .create_order(user.id, &payload.items, payload.total_price)
        .await?;
    Ok((StatusCode::CREATED, Json(confirmation)))
}

/// GET /api/orders - 当前账户的订单历史, 新订单在前
///
/// 无订单返回空数组而非错误。
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<OrderDetail>>> {
    let repo = OrderRepository::new(state.pool().clone());
    let orders = repo.find_by_account(user.id).await?;
    Ok(Json(orders))
}

/// PATCH /api/orders/:id/status - 推进取餐状态 (仅供应商)
///
/// `ordered → ready → collected`, 只进不退。
pub async fn update_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<Order>> {
    if !user.is_provider() {
        return Err(AppError::forbidden("Provider role required".to_string()));
    }

    let repo = OrderRepository::new(state.pool().clone());
    let order = repo.transition_status(id, payload.status).await?;
    Ok(Json(order))
}
