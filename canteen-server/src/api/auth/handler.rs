//! Authentication Handlers
//!
//! Handles registration and login

use axum::{Json, extract::State, http::StatusCode};
use shared::models::Role;
use shared::request::{LoginRequest, RegisterRequest};
use shared::response::{LoginResponse, RegisterResponse, UserInfo};

use crate::auth::{hash_password, verify_password};
use crate::core::ServerState;
use crate::db::repository::AccountRepository;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_PASSWORD_LEN, validate_email, validate_optional_text,
    validate_required_text,
};
use crate::utils::{AppError, AppResult};

/// POST /api/register - 注册账户
///
/// 角色默认 student；供应商注册时带 `"role": "provider"`。
pub async fn register(
    State(state): State<ServerState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    validate_email(&req.email)?;
    validate_required_text(&req.password, "password", MAX_PASSWORD_LEN)?;
    validate_optional_text(&req.name, "name", MAX_NAME_LEN)?;

    let password_hash = hash_password(&req.password)?;
    let role = req.role.unwrap_or(Role::Student);

    let repo = AccountRepository::new(state.pool().clone());
    let account = repo
        .create(req.name, &req.email, &password_hash, role)
        .await
        .map_err(|e| match e {
            crate::db::repository::RepoError::Duplicate(_) => {
                AppError::conflict("Email already exists")
            }
            other => other.into(),
        })?;

    tracing::info!(account_id = account.id, role = %account.role, "account registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".into(),
            user_id: account.id,
        }),
    ))
}

/// POST /api/login - 登录
///
/// 账户不存在和密码错误返回同一错误，避免账户枚举。
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let repo = AccountRepository::new(state.pool().clone());
    let account = repo
        .find_by_email(&req.email)
        .await?
        .ok_or_else(AppError::invalid_credentials)?;

    if !verify_password(&req.password, &account.password_hash)? {
        tracing::warn!(email = %req.email, "login failed - invalid credentials");
        return Err(AppError::invalid_credentials());
    }

    let token = state
        .get_jwt_service()
        .generate_token(&account)
        .map_err(|e| AppError::internal(format!("Token generation failed: {e}")))?;

    Ok(Json(LoginResponse {
        message: "Login successful".into(),
        token,
        user: UserInfo {
            id: account.id,
            name: account.name,
            email: account.email,
            role: account.role,
        },
    }))
}
