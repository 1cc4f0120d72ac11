//! Auth API Handlers

use std::time::Duration;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::User;
use crate::db::repository::UserRepository;
use shared::{AppError, AppResult, AuthPayload, LoginRequest, RegisterRequest, ok};

/// 登录固定耗时，弱化时序侧信道
const LOGIN_MIN_DELAY: Duration = Duration::from_millis(500);

/// POST /api/auth/register - 注册新用户
pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    validate_registration(&payload)?;

    let repo = UserRepository::new(state.db.clone());
    let user = repo.create(payload).await?;

    let token = issue_token(&state, &user)?;
    Ok((
        StatusCode::CREATED,
        ok(AuthPayload { token, user }),
    ))
}

/// POST /api/auth/login - 登录
///
/// 无论失败原因（未知邮箱、密码错误、账号停用）都返回同一条
/// 消息，且整体耗时固定。
pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<shared::AppResponse<AuthPayload<User>>>> {
    tokio::time::sleep(LOGIN_MIN_DELAY).await;

    let repo = UserRepository::new(state.db.clone());
    let user = repo
        .find_by_email(&payload.email)
        .await?
        .ok_or_else(AppError::invalid_credentials)?;

    let verified = user.verify_password(&payload.password).unwrap_or(false);
    if !verified || !user.is_active {
        return Err(AppError::invalid_credentials());
    }

    let token = issue_token(&state, &user)?;
    tracing::info!(email = %user.email, "User logged in");
    Ok(ok(AuthPayload { token, user }))
}

/// GET /api/auth/me - 当前用户信息
pub async fn me(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<shared::AppResponse<User>>> {
    let repo = UserRepository::new(state.db.clone());
    let user = repo
        .find_by_id(&current.id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    Ok(ok(user))
}

fn issue_token(state: &ServerState, user: &User) -> AppResult<String> {
    let user_id = user
        .id
        .as_ref()
        .map(|id| id.to_string())
        .ok_or_else(|| AppError::internal("User record without id"))?;
    state
        .get_jwt_service()
        .generate_token(user_id, &user.email, user.role)
        .map_err(|e| AppError::internal(format!("Token generation failed: {e}")))
}

fn validate_registration(payload: &RegisterRequest) -> AppResult<()> {
    if payload.username.trim().is_empty() {
        return Err(AppError::validation("Username is required"));
    }
    if !payload.email.contains('@') {
        return Err(AppError::validation("Invalid email address"));
    }
    if payload.password.len() < 8 {
        return Err(AppError::validation(
            "Password must be at least 8 characters",
        ));
    }
    Ok(())
}
