//! Category API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Category, CategoryCreate, CategoryUpdate};
use crate::db::repository::CategoryRepository;
use shared::{AppError, AppResponse, AppResult, ok, ok_with_message};

/// GET /api/categories - 获取所有分类（公开）
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<AppResponse<Vec<Category>>>> {
    let repo = CategoryRepository::new(state.db.clone());
    let categories = repo.find_all().await?;
    Ok(ok(categories))
}

/// GET /api/categories/:id - 获取单个分类（公开）
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Category>>> {
    let repo = CategoryRepository::new(state.db.clone());
    let category = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Category {id} not found")))?;
    Ok(ok(category))
}

/// POST /api/categories - 创建分类（仅管理员）
pub async fn create(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<CategoryCreate>,
) -> AppResult<impl IntoResponse> {
    ensure_admin(&current)?;

    let repo = CategoryRepository::new(state.db.clone());
    let category = repo.create(payload).await?;
    Ok((StatusCode::CREATED, ok(category)))
}

/// PUT /api/categories/:id - 更新分类（仅管理员）
pub async fn update(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<CategoryUpdate>,
) -> AppResult<Json<AppResponse<Category>>> {
    ensure_admin(&current)?;

    let repo = CategoryRepository::new(state.db.clone());
    let category = repo.update(&id, payload).await?;
    Ok(ok(category))
}

/// DELETE /api/categories/:id - 删除分类（仅管理员，软删除）
pub async fn delete(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<bool>>> {
    ensure_admin(&current)?;

    let repo = CategoryRepository::new(state.db.clone());
    let deleted = repo.delete(&id).await?;
    Ok(ok_with_message(deleted, "Category deleted"))
}

fn ensure_admin(current: &CurrentUser) -> AppResult<()> {
    if current.is_admin() {
        Ok(())
    } else {
        Err(AppError::forbidden("Admin access required"))
    }
}
