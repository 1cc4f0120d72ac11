//! Vendor API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Order, Rider, Vendor, VendorCreate, VendorUpdate};
use crate::db::repository::{
    AssignmentRepository, ProductRepository, RiderRepository, VendorRepository, parse_id,
};
use shared::{AppError, AppResponse, AppResult, Page, ok, ok_with_message};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub verified: Option<bool>,
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

/// Vendor listing entry with its active product count
#[derive(Debug, Serialize)]
pub struct VendorListItem {
    #[serde(flatten)]
    pub vendor: Vendor,
    pub product_count: i64,
}

/// Vendor detail with the riders currently assigned to it
#[derive(Debug, Serialize)]
pub struct VendorDetail {
    #[serde(flatten)]
    pub vendor: Vendor,
    pub riders: Vec<Rider>,
}

/// GET /api/vendors - 商家列表（公开）
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<AppResponse<Page<VendorListItem>>>> {
    let per_page = query.per_page.clamp(1, 100);
    let vendor_repo = VendorRepository::new(state.db.clone());
    let product_repo = ProductRepository::new(state.db.clone());

    let (vendors, total) = vendor_repo
        .find_page(query.search, query.verified, query.page, per_page)
        .await?;

    let mut items = Vec::with_capacity(vendors.len());
    for vendor in vendors {
        let product_count = match &vendor.id {
            Some(id) => product_repo.count_for_vendor(id).await?,
            None => 0,
        };
        items.push(VendorListItem {
            vendor,
            product_count,
        });
    }

    Ok(ok(Page::new(items, total, per_page, query.page)))
}

/// GET /api/vendors/:id - 商家详情（公开，含在班骑手）
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<VendorDetail>>> {
    let vendor_repo = VendorRepository::new(state.db.clone());
    let vendor = vendor_repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Vendor {id} not found")))?;

    let riders = match &vendor.id {
        Some(vid) => {
            AssignmentRepository::new(state.db.clone())
                .riders_for_vendor(vid)
                .await?
        }
        None => Vec::new(),
    };

    Ok(ok(VendorDetail { vendor, riders }))
}

/// GET /api/vendors/profile - 自己的商家档案
pub async fn get_profile(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<AppResponse<Vendor>>> {
    let vendor = own_profile(&state, &current).await?;
    Ok(ok(vendor))
}

/// POST /api/vendors/profile - 创建商家档案（每个用户最多一个）
pub async fn create_profile(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<VendorCreate>,
) -> AppResult<impl IntoResponse> {
    if current.role != shared::UserRole::Vendor {
        return Err(AppError::forbidden("Vendor role required"));
    }
    let user_id = parse_id("user", &current.id)?;
    let repo = VendorRepository::new(state.db.clone());
    let vendor = repo.create(&user_id, payload).await?;
    Ok((StatusCode::CREATED, ok(vendor)))
}

/// PUT /api/vendors/profile - 更新自己的商家档案
pub async fn update_profile(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<VendorUpdate>,
) -> AppResult<Json<AppResponse<Vendor>>> {
    let vendor = own_profile(&state, &current).await?;
    let vendor_id = vendor
        .id
        .ok_or_else(|| AppError::internal("Vendor record without id"))?;

    let repo = VendorRepository::new(state.db.clone());
    let vendor = repo.update(&vendor_id.to_string(), payload).await?;
    Ok(ok(vendor))
}

/// GET /api/vendors/:id/riders - 商家车队（本商家或管理员）
pub async fn list_riders(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Vec<Rider>>>> {
    let vendor = ensure_vendor_access(&state, &current, &id).await?;
    let vendor_id = vendor
        .id
        .ok_or_else(|| AppError::internal("Vendor record without id"))?;

    let riders = AssignmentRepository::new(state.db.clone())
        .riders_for_vendor(&vendor_id)
        .await?;
    Ok(ok(riders))
}

/// POST /api/vendors/:id/riders/:rider_id - 分配骑手到车队
pub async fn assign_rider(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path((id, rider_id)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let vendor = ensure_vendor_access(&state, &current, &id).await?;
    let vendor_id = vendor
        .id
        .ok_or_else(|| AppError::internal("Vendor record without id"))?;

    let rider = RiderRepository::new(state.db.clone())
        .find_by_id(&rider_id)
        .await?
        .filter(|r| r.is_active && r.is_verified)
        .ok_or_else(|| AppError::not_found("Rider not found or not verified"))?;

    let assignment = AssignmentRepository::new(state.db.clone())
        .assign(&vendor_id, &rider)
        .await?;
    Ok((StatusCode::CREATED, ok(assignment)))
}

/// DELETE /api/vendors/:id/riders/:rider_id - 将骑手移出车队
pub async fn unassign_rider(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path((id, rider_id)): Path<(String, String)>,
) -> AppResult<Json<AppResponse<bool>>> {
    let vendor = ensure_vendor_access(&state, &current, &id).await?;
    let vendor_id = vendor
        .id
        .ok_or_else(|| AppError::internal("Vendor record without id"))?;
    let rider_id = parse_id("rider", &rider_id)?;

    AssignmentRepository::new(state.db.clone())
        .unassign(&vendor_id, &rider_id)
        .await?;
    Ok(ok_with_message(true, "Rider unassigned"))
}

/// GET /api/vendors/:id/analytics - 商家经营统计（本商家或管理员）
pub async fn analytics(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Value>>> {
    let vendor = ensure_vendor_access(&state, &current, &id).await?;
    let vendor_id = vendor
        .id
        .ok_or_else(|| AppError::internal("Vendor record without id"))?;

    let mut result = state
        .db
        .query(
            r#"
            LET $orders = (SELECT status, total_amount FROM order WHERE vendor = $vendor);
            LET $delivered = $orders[WHERE status = 'delivered'];
            LET $revenue = math::sum($delivered.total_amount) OR 0;
            SELECT * FROM order WHERE vendor = $vendor ORDER BY created_at DESC LIMIT 10;
            RETURN {
                total_orders: count($orders),
                delivered_orders: count($delivered),
                pending_orders: count($orders[WHERE status = 'pending']),
                cancelled_orders: count($orders[WHERE status = 'cancelled']),
                total_revenue: $revenue,
                average_order_value: IF count($delivered) > 0
                    { $revenue / count($delivered) } ELSE { 0 },
                active_products: (SELECT count() AS c FROM product
                    WHERE vendor = $vendor AND is_active = true GROUP ALL)[0].c OR 0,
                rating: $rating,
            };
            "#,
        )
        .bind(("vendor", vendor_id))
        .bind(("rating", vendor.rating))
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    let recent: Vec<Order> = result
        .take(3)
        .map_err(|e| AppError::database(e.to_string()))?;
    let stats: Option<Value> = result
        .take(4)
        .map_err(|e| AppError::database(e.to_string()))?;

    let mut stats = stats.unwrap_or_else(|| serde_json::json!({}));
    stats["recent_orders"] =
        serde_json::to_value(recent).map_err(|e| AppError::internal(e.to_string()))?;
    Ok(ok(stats))
}

async fn own_profile(state: &ServerState, current: &CurrentUser) -> AppResult<Vendor> {
    let user_id = parse_id("user", &current.id)?;
    VendorRepository::new(state.db.clone())
        .find_by_user(&user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Vendor profile not found"))
}

/// Resolve the vendor and require the caller to own it or be an admin
async fn ensure_vendor_access(
    state: &ServerState,
    current: &CurrentUser,
    vendor_id: &str,
) -> AppResult<Vendor> {
    let repo = VendorRepository::new(state.db.clone());
    let vendor = repo
        .find_by_id(vendor_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Vendor {vendor_id} not found")))?;

    if current.is_admin() {
        return Ok(vendor);
    }
    let user_id = parse_id("user", &current.id)?;
    if vendor.user == user_id {
        Ok(vendor)
    } else {
        Err(AppError::forbidden("Not authorized to manage this vendor"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtService;
    use crate::core::Config;
    use crate::db::DbService;
    use shared::{DeliveryType, OrderStatus, PaymentStatus, UserRole};
    use std::sync::Arc;
    use surrealdb::RecordId;

    async fn test_state(dir: &tempfile::TempDir) -> ServerState {
        let db_path = dir.path().join("test.db");
        let service = DbService::new(&db_path.to_string_lossy()).await.unwrap();
        let config = Config::with_overrides(dir.path().to_string_lossy(), 0);
        let jwt = Arc::new(JwtService::with_config(config.jwt.clone()));
        ServerState::new(config, service.db, jwt)
    }

    fn vendor_row(user_key: &str) -> Vendor {
        Vendor {
            id: None,
            user: parse_id("user", user_key).unwrap(),
            business_name: "Corner Grocer".to_string(),
            business_description: None,
            business_address: None,
            business_phone: None,
            business_email: None,
            business_registration: None,
            vat_number: None,
            delivery_fee: 3.0,
            peak_delivery_fee: 5.0,
            free_delivery_threshold: 30.0,
            delivery_radius: 5.0,
            preparation_time: 20,
            is_active: true,
            is_verified: true,
            rating: 4.2,
            total_orders: 0,
            created_at: 1,
            updated_at: 1,
        }
    }

    fn order_row(number: &str, vendor: RecordId, status: OrderStatus, total: f64) -> Order {
        Order {
            id: None,
            order_number: number.to_string(),
            customer: parse_id("user", "buyer1").unwrap(),
            vendor,
            rider: None,
            status,
            delivery_type: DeliveryType::Pickup,
            subtotal: total,
            delivery_fee: 0.0,
            service_fee: 0.0,
            discount_amount: 0.0,
            total_amount: total,
            payment_status: PaymentStatus::Pending,
            payment_method: None,
            delivery_address: None,
            delivery_instructions: None,
            pickup_code: Some("123456".to_string()),
            vendor_notes: None,
            rider_notes: None,
            estimated_delivery_time: 2,
            preparation_started_at: None,
            ready_for_pickup_at: None,
            out_for_delivery_at: None,
            delivered_at: None,
            created_at: 1,
            updated_at: 1,
        }
    }

    #[tokio::test]
    async fn test_analytics_includes_recent_orders() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir).await;

        let vendor: Option<Vendor> = state
            .db
            .create("vendor")
            .content(vendor_row("v1"))
            .await
            .unwrap();
        let vendor_id = vendor.unwrap().id.unwrap();

        let _: Option<Order> = state
            .db
            .create("order")
            .content(order_row(
                "HO-20260101-CCCCCC",
                vendor_id.clone(),
                OrderStatus::Delivered,
                25.0,
            ))
            .await
            .unwrap();
        let _: Option<Order> = state
            .db
            .create("order")
            .content(order_row(
                "HO-20260101-DDDDDD",
                vendor_id.clone(),
                OrderStatus::Pending,
                12.0,
            ))
            .await
            .unwrap();

        let current = CurrentUser {
            id: "user:admin1".to_string(),
            email: "admin@example.com".to_string(),
            role: UserRole::Admin,
        };
        let response = analytics(State(state), current, Path(vendor_id.to_string()))
            .await
            .unwrap();
        let stats = response.0.data.unwrap();

        assert_eq!(stats["total_orders"].as_u64(), Some(2));
        assert_eq!(stats["delivered_orders"].as_u64(), Some(1));
        assert_eq!(stats["total_revenue"].as_f64(), Some(25.0));
        assert_eq!(stats["recent_orders"].as_array().unwrap().len(), 2);
    }
}
