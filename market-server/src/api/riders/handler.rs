//! Rider API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Order, Rider, RiderCreate, RiderUpdate};
use crate::db::repository::order::OrderScope;
use crate::db::repository::{
    AssignmentRepository, OrderRepository, RiderRepository, VendorRepository, parse_id,
};
use shared::{AppError, AppResponse, AppResult, OrderStatus, Page, UserRole, ok, ok_with_message};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub available: Option<bool>,
    #[serde(default)]
    pub verified: Option<bool>,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
    #[serde(default)]
    pub status: Option<OrderStatus>,
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    20
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityPayload {
    pub is_available: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct LocationPayload {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// GET /api/riders - 骑手列表
///
/// 管理员看全量；商家只看自己车队的骑手。
pub async fn list(
    State(state): State<ServerState>,
    current: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<AppResponse<Page<Rider>>>> {
    match current.role {
        UserRole::Admin => {
            let per_page = query.per_page.clamp(1, 100);
            let repo = RiderRepository::new(state.db.clone());
            let (riders, total) = repo
                .find_page(query.available, query.verified, query.page, per_page)
                .await?;
            Ok(ok(Page::new(riders, total, per_page, query.page)))
        }
        UserRole::Vendor => {
            let user_id = parse_id("user", &current.id)?;
            let vendor = VendorRepository::new(state.db.clone())
                .find_by_user(&user_id)
                .await?
                .ok_or_else(|| AppError::not_found("Vendor profile not found"))?;
            let vendor_id = vendor
                .id
                .ok_or_else(|| AppError::internal("Vendor record without id"))?;

            let mut riders = AssignmentRepository::new(state.db.clone())
                .riders_for_vendor(&vendor_id)
                .await?;
            if let Some(available) = query.available {
                riders.retain(|r| r.is_available == available);
            }
            let total = riders.len() as u64;
            Ok(ok(Page::new(riders, total, total.max(1), 1)))
        }
        _ => Err(AppError::forbidden("Admin or vendor access required")),
    }
}

/// GET /api/riders/:id - 骑手详情（管理员、本人或其所属商家）
pub async fn get_by_id(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Rider>>> {
    let repo = RiderRepository::new(state.db.clone());
    let rider = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Rider {id} not found")))?;

    if rider_visible_to(&state, &current, &rider).await? {
        Ok(ok(rider))
    } else {
        Err(AppError::forbidden("Not authorized to view this rider"))
    }
}

/// GET /api/riders/profile - 自己的骑手档案
pub async fn get_profile(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<AppResponse<Rider>>> {
    let rider = own_profile(&state, &current).await?;
    Ok(ok(rider))
}

/// POST /api/riders/profile - 创建骑手档案（每个用户最多一个）
pub async fn create_profile(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<RiderCreate>,
) -> AppResult<impl IntoResponse> {
    if current.role != UserRole::Rider {
        return Err(AppError::forbidden("Rider role required"));
    }
    let user_id = parse_id("user", &current.id)?;
    let repo = RiderRepository::new(state.db.clone());
    let rider = repo.create(&user_id, payload).await?;
    Ok((StatusCode::CREATED, ok(rider)))
}

/// PUT /api/riders/profile - 更新自己的骑手档案
pub async fn update_profile(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<RiderUpdate>,
) -> AppResult<Json<AppResponse<Rider>>> {
    let rider = own_profile(&state, &current).await?;
    let rider_id = rider
        .id
        .ok_or_else(|| AppError::internal("Rider record without id"))?;

    let repo = RiderRepository::new(state.db.clone());
    let rider = repo.update(&rider_id.to_string(), payload).await?;
    Ok(ok(rider))
}

/// PUT /api/riders/availability - 上下班切换
pub async fn set_availability(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<AvailabilityPayload>,
) -> AppResult<Json<AppResponse<Rider>>> {
    let available = payload
        .is_available
        .ok_or_else(|| AppError::validation("is_available is required"))?;

    let rider = own_profile(&state, &current).await?;
    let rider_id = rider
        .id
        .ok_or_else(|| AppError::internal("Rider record without id"))?;

    let repo = RiderRepository::new(state.db.clone());
    let rider = repo.set_available(&rider_id.to_string(), available).await?;
    Ok(ok(rider))
}

/// PUT /api/riders/location - 上报当前位置
pub async fn update_location(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<LocationPayload>,
) -> AppResult<Json<AppResponse<Rider>>> {
    let (lat, lng) = match (payload.latitude, payload.longitude) {
        (Some(lat), Some(lng)) => (lat, lng),
        _ => {
            return Err(AppError::validation(
                "Both latitude and longitude are required",
            ));
        }
    };

    let rider = own_profile(&state, &current).await?;
    let rider_id = rider
        .id
        .ok_or_else(|| AppError::internal("Rider record without id"))?;

    let repo = RiderRepository::new(state.db.clone());
    let rider = repo.update_location(&rider_id.to_string(), lat, lng).await?;
    Ok(ok(rider))
}

/// GET /api/riders/deliveries - 自己的配送单列表
pub async fn list_deliveries(
    State(state): State<ServerState>,
    current: CurrentUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<AppResponse<Page<Order>>>> {
    let rider = own_profile(&state, &current).await?;
    let rider_id = rider
        .id
        .ok_or_else(|| AppError::internal("Rider record without id"))?;

    let per_page = query.per_page.clamp(1, 100);
    let repo = OrderRepository::new(state.db.clone());
    let (orders, total) = repo
        .find_page(OrderScope::Rider(rider_id), query.status, query.page, per_page)
        .await?;
    Ok(ok(Page::new(orders, total, per_page, query.page)))
}

/// GET /api/riders/analytics - 自己的配送统计
pub async fn analytics(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<AppResponse<Value>>> {
    let rider = own_profile(&state, &current).await?;
    let rider_id = rider
        .id
        .clone()
        .ok_or_else(|| AppError::internal("Rider record without id"))?;

    let repo = OrderRepository::new(state.db.clone());
    let (_, active_deliveries) = repo
        .find_page(
            OrderScope::Rider(rider_id.clone()),
            Some(OrderStatus::OutForDelivery),
            1,
            1,
        )
        .await?;
    let (recent_deliveries, _) = repo
        .find_page(OrderScope::Rider(rider_id), None, 1, 10)
        .await?;

    Ok(ok(json!({
        "total_deliveries": rider.total_deliveries,
        "successful_deliveries": rider.successful_deliveries,
        "active_deliveries": active_deliveries,
        "success_rate": success_rate_percent(rider.successful_deliveries, rider.total_deliveries),
        "rating": rider.rating,
        "is_available": rider.is_available,
        "is_verified": rider.is_verified,
        "recent_deliveries": recent_deliveries,
    })))
}

/// Completed deliveries as a percentage of the total, rounded to 2dp.
/// A rider with no history reads 0, not a division error.
fn success_rate_percent(successful: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    (successful as f64 / total as f64 * 10_000.0).round() / 100.0
}

/// PUT /api/riders/:id/verify - 审核通过骑手（仅管理员）
pub async fn verify(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Rider>>> {
    if !current.is_admin() {
        return Err(AppError::forbidden("Admin access required"));
    }

    let repo = RiderRepository::new(state.db.clone());
    let rider = repo.set_verified(&id, true).await?;
    Ok(ok_with_message(rider, "Rider verified"))
}

async fn own_profile(state: &ServerState, current: &CurrentUser) -> AppResult<Rider> {
    let user_id = parse_id("user", &current.id)?;
    RiderRepository::new(state.db.clone())
        .find_by_user(&user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Rider profile not found"))
}

/// Admin, the rider themselves, or a vendor the rider is assigned to
async fn rider_visible_to(
    state: &ServerState,
    current: &CurrentUser,
    rider: &Rider,
) -> AppResult<bool> {
    if current.is_admin() {
        return Ok(true);
    }
    let user_id = parse_id("user", &current.id)?;
    if rider.user == user_id {
        return Ok(true);
    }
    if current.role == UserRole::Vendor {
        let vendor = VendorRepository::new(state.db.clone())
            .find_by_user(&user_id)
            .await?;
        if let (Some(vendor), Some(rider_id)) = (vendor, rider.id.as_ref())
            && let Some(vendor_id) = vendor.id
        {
            let active = AssignmentRepository::new(state.db.clone())
                .find_active(&vendor_id, rider_id)
                .await?;
            return Ok(active.is_some());
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtService;
    use crate::core::Config;
    use crate::db::DbService;
    use shared::{DeliveryType, PaymentStatus};
    use std::sync::Arc;
    use surrealdb::RecordId;

    #[test]
    fn test_success_rate_is_a_percentage() {
        assert_eq!(success_rate_percent(3, 4), 75.0);
        assert_eq!(success_rate_percent(10, 10), 100.0);
        assert_eq!(success_rate_percent(1, 3), 33.33);
    }

    #[test]
    fn test_success_rate_with_no_deliveries_is_zero() {
        assert_eq!(success_rate_percent(0, 0), 0.0);
    }

    async fn test_state(dir: &tempfile::TempDir) -> ServerState {
        let db_path = dir.path().join("test.db");
        let service = DbService::new(&db_path.to_string_lossy()).await.unwrap();
        let config = Config::with_overrides(dir.path().to_string_lossy(), 0);
        let jwt = Arc::new(JwtService::with_config(config.jwt.clone()));
        ServerState::new(config, service.db, jwt)
    }

    fn rider_row(user_key: &str, total: i64, successful: i64) -> Rider {
        Rider {
            id: None,
            user: parse_id("user", user_key).unwrap(),
            vehicle_type: Some("bicycle".to_string()),
            license_number: None,
            vehicle_registration: None,
            is_active: true,
            is_available: true,
            is_verified: true,
            rating: 4.5,
            total_deliveries: total,
            successful_deliveries: successful,
            current_latitude: None,
            current_longitude: None,
            last_location_update: None,
            created_at: 1,
            updated_at: 1,
        }
    }

    fn order_row(number: &str, rider: Option<RecordId>, status: OrderStatus) -> Order {
        Order {
            id: None,
            order_number: number.to_string(),
            customer: parse_id("user", "buyer1").unwrap(),
            vendor: parse_id("vendor", "v1").unwrap(),
            rider,
            status,
            delivery_type: DeliveryType::Delivery,
            subtotal: 20.0,
            delivery_fee: 3.0,
            service_fee: 1.0,
            discount_amount: 0.0,
            total_amount: 24.0,
            payment_status: PaymentStatus::Pending,
            payment_method: None,
            delivery_address: Some("1 High Street".to_string()),
            delivery_instructions: None,
            pickup_code: None,
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
    async fn test_analytics_reports_percentage_and_recent_deliveries() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir).await;

        let rider: Option<Rider> = state
            .db
            .create("rider")
            .content(rider_row("r1", 4, 3))
            .await
            .unwrap();
        let rider_id = rider.unwrap().id.unwrap();

        let _: Option<Order> = state
            .db
            .create("order")
            .content(order_row(
                "HO-20260101-AAAAAA",
                Some(rider_id.clone()),
                OrderStatus::Delivered,
            ))
            .await
            .unwrap();
        let _: Option<Order> = state
            .db
            .create("order")
            .content(order_row(
                "HO-20260101-BBBBBB",
                Some(rider_id.clone()),
                OrderStatus::OutForDelivery,
            ))
            .await
            .unwrap();

        let current = CurrentUser {
            id: "user:r1".to_string(),
            email: "rider@example.com".to_string(),
            role: UserRole::Rider,
        };
        let response = analytics(State(state), current).await.unwrap();
        let stats = response.0.data.unwrap();

        assert_eq!(stats["success_rate"].as_f64(), Some(75.0));
        assert_eq!(stats["active_deliveries"].as_u64(), Some(1));
        assert_eq!(stats["recent_deliveries"].as_array().unwrap().len(), 2);
    }
}
