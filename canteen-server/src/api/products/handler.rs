//! Product API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use shared::models::{Product, ProductCreate, ProductUpdate};
use shared::response::MessageResponse;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{AccountRepository, ProductRepository};
use crate::utils::validation::{
    MAX_DESCRIPTION_LEN, MAX_NAME_LEN, MAX_URL_LEN, validate_optional_text, validate_price,
    validate_required_text,
};
use crate::utils::{AppError, AppResult};

/// GET /api/products - 公开目录 (仅在售商品)
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Product>>> {
    let repo = ProductRepository::new(state.pool().clone());
    let products = repo.find_available().await?;
    Ok(Json(products))
}

/// GET /api/products/:id - 获取单个商品
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Product>> {
    let repo = ProductRepository::new(state.pool().clone());
    let product = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {id}")))?;
    Ok(Json(product))
}

/// GET /api/my-products - 供应商自己的商品 (含已下架)
pub async fn my_products(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<Product>>> {
    require_provider(&user)?;
    let repo = ProductRepository::new(state.pool().clone());
    let products = repo.find_by_provider(user.id).await?;
    Ok(Json(products))
}

/// POST /api/products - 新建商品 (仅供应商)
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<ProductCreate>,
) -> AppResult<(StatusCode, Json<Product>)> {
    require_provider(&user)?;
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_DESCRIPTION_LEN)?;
    validate_optional_text(&payload.image, "image", MAX_URL_LEN)?;
    validate_price(payload.price)?;

    // Vendor display name shown in the catalog: account name, or email as fallback
    let accounts = AccountRepository::new(state.pool().clone());
    let account = accounts
        .find_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::internal(format!("account {} vanished", user.id)))?;
    let provider_name = account.name.unwrap_or(account.email);

    let repo = ProductRepository::new(state.pool().clone());
    let product = repo.create(user.id, &provider_name, payload).await?;

    tracing::info!(product_id = product.id, provider_id = user.id, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /api/products/:id - 更新商品 (仅属主)
pub async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<ProductUpdate>,
) -> AppResult<Json<Product>> {
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    validate_optional_text(&payload.description, "description", MAX_DESCRIPTION_LEN)?;
    validate_optional_text(&payload.image, "image", MAX_URL_LEN)?;
    if let Some(price) = payload.price {
        validate_price(price)?;
    }

    let repo = ProductRepository::new(state.pool().clone());
    let product = find_owned(&repo, &user, id).await?;
    let updated = repo.update(product.id, payload).await?;
    Ok(Json(updated))
}

/// DELETE /api/products/:id - 删除商品 (仅属主)
pub async fn delete(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<MessageResponse>> {
    let repo = ProductRepository::new(state.pool().clone());
    let product = find_owned(&repo, &user, id).await?;
    repo.delete(product.id).await?;

    tracing::info!(product_id = id, provider_id = user.id, "product deleted");
    Ok(Json(MessageResponse::new("Product deleted successfully")))
}

fn require_provider(user: &CurrentUser) -> Result<(), AppError> {
    if !user.is_provider() {
        return Err(AppError::forbidden("Provider role required".to_string()));
    }
    Ok(())
}

/// Fetch a product and check it belongs to the caller
async fn find_owned(
    repo: &ProductRepository,
    user: &CurrentUser,
    id: i64,
) -> Result<Product, AppError> {
    require_provider(user)?;
    let product = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {id}")))?;
    if product.provider_id != user.id {
        return Err(AppError::forbidden(
            "You can only manage your own products".to_string(),
        ));
    }
    Ok(product)
}
