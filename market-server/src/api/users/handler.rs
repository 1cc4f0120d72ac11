//! User API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{User, UserUpdate};
use crate::db::repository::{UserRepository, parse_id};
use shared::{AppError, AppResponse, AppResult, Page, UserRole, ok, ok_with_message};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    20
}

/// GET /api/users - 用户列表（仅管理员）
pub async fn list(
    State(state): State<ServerState>,
    current: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<AppResponse<Page<User>>>> {
    if !current.is_admin() {
        return Err(AppError::forbidden("Admin access required"));
    }

    let per_page = query.per_page.clamp(1, 100);
    let repo = UserRepository::new(state.db.clone());
    let (users, total) = repo.find_page(query.role, query.page, per_page).await?;
    Ok(ok(Page::new(users, total, per_page, query.page)))
}

/// GET /api/users/:id - 获取用户（本人或管理员）
pub async fn get_by_id(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<User>>> {
    ensure_self_or_admin(&current, &id)?;

    let repo = UserRepository::new(state.db.clone());
    let user = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User {id} not found")))?;
    Ok(ok(user))
}

/// PUT /api/users/:id - 更新用户
///
/// 本人可改个人资料；角色与启用状态只有管理员能改，非管理员
/// 提交的这两个字段会被静默丢弃。
pub async fn update(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(mut payload): Json<UserUpdate>,
) -> AppResult<Json<AppResponse<User>>> {
    ensure_self_or_admin(&current, &id)?;

    if !current.is_admin() {
        payload.role = None;
        payload.is_active = None;
    }

    let repo = UserRepository::new(state.db.clone());
    let user = repo.update(&id, payload).await?;
    Ok(ok(user))
}

/// DELETE /api/users/:id - 删除用户（管理员，不能删除自己）
pub async fn delete(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<bool>>> {
    if !current.is_admin() {
        return Err(AppError::forbidden("Admin access required"));
    }
    if same_user(&current.id, &id) {
        return Err(AppError::forbidden("Cannot delete your own account"));
    }

    let repo = UserRepository::new(state.db.clone());
    let deleted = repo.delete(&id).await?;
    Ok(ok_with_message(deleted, "User deleted"))
}

fn ensure_self_or_admin(current: &CurrentUser, target_id: &str) -> AppResult<()> {
    if current.is_admin() || same_user(&current.id, target_id) {
        Ok(())
    } else {
        Err(AppError::forbidden("Not authorized to access this user"))
    }
}

/// Compare ids accepting both "key" and "user:key" forms
fn same_user(current_id: &str, target_id: &str) -> bool {
    match (parse_id("user", current_id), parse_id("user", target_id)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
