//! Product API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Product, ProductCreate, ProductUpdate, Vendor};
use crate::db::repository::product::ProductFilter;
use crate::db::repository::{ProductRepository, VendorRepository, parse_id};
use shared::{AppError, AppResponse, AppResult, Page, UserRole, ok, ok_with_message};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub vendor_id: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub featured: Option<bool>,
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

/// GET /api/products - 商品列表（公开，支持过滤）
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<AppResponse<Page<Product>>>> {
    let per_page = query.per_page.clamp(1, 100);
    let filter = ProductFilter {
        category_id: query.category_id,
        vendor_id: query.vendor_id,
        search: query.search,
        featured: query.featured,
    };

    let repo = ProductRepository::new(state.db.clone());
    let (products, total) = repo.find_page(filter, query.page, per_page).await?;
    Ok(ok(Page::new(products, total, per_page, query.page)))
}

/// GET /api/products/:id - 获取商品（公开）
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Product>>> {
    let repo = ProductRepository::new(state.db.clone());
    let product = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {id} not found")))?;
    Ok(ok(product))
}

/// POST /api/products - 创建商品（商家，需已有商家档案）
pub async fn create(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<ProductCreate>,
) -> AppResult<impl IntoResponse> {
    if current.role != UserRole::Vendor {
        return Err(AppError::forbidden("Vendor access required"));
    }
    let vendor = own_vendor_profile(&state, &current).await?;
    let vendor_id = vendor
        .id
        .ok_or_else(|| AppError::internal("Vendor record without id"))?;

    if payload.price < 0.0 {
        return Err(AppError::validation("Price cannot be negative"));
    }

    let repo = ProductRepository::new(state.db.clone());
    let product = repo.create(&vendor_id, payload).await?;
    Ok((StatusCode::CREATED, ok(product)))
}

/// PUT /api/products/:id - 更新商品（商品所属商家或管理员）
pub async fn update(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<ProductUpdate>,
) -> AppResult<Json<AppResponse<Product>>> {
    let repo = ProductRepository::new(state.db.clone());
    let product = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {id} not found")))?;
    ensure_owner_or_admin(&state, &current, &product).await?;

    if let Some(price) = payload.price
        && price < 0.0
    {
        return Err(AppError::validation("Price cannot be negative"));
    }

    let product = repo.update(&id, payload).await?;
    Ok(ok(product))
}

/// DELETE /api/products/:id - 下架商品（软删除）
pub async fn delete(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<bool>>> {
    let repo = ProductRepository::new(state.db.clone());
    let product = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {id} not found")))?;
    ensure_owner_or_admin(&state, &current, &product).await?;

    let deleted = repo.delete(&id).await?;
    Ok(ok_with_message(deleted, "Product removed"))
}

/// 当前用户的商家档案
async fn own_vendor_profile(state: &ServerState, current: &CurrentUser) -> AppResult<Vendor> {
    let user_id = parse_id("user", &current.id)?;
    let repo = VendorRepository::new(state.db.clone());
    repo.find_by_user(&user_id)
        .await?
        .ok_or_else(|| AppError::forbidden("Vendor profile required"))
}

async fn ensure_owner_or_admin(
    state: &ServerState,
    current: &CurrentUser,
    product: &Product,
) -> AppResult<()> {
    if current.is_admin() {
        return Ok(());
    }
    if current.role == UserRole::Vendor {
        let vendor = own_vendor_profile(state, current).await?;
        if vendor.id.as_ref() == Some(&product.vendor) {
            return Ok(());
        }
    }
    Err(AppError::forbidden("Not authorized to manage this product"))
}
