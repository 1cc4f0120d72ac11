//! Order API Handlers
//!
//! 下单、查询、状态流转与骑手分配。权限判断统一走
//! `orders::policy`，状态机与计价在 `orders` 域模块中。

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{Duration, Local, Timelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Order, OrderCreate, OrderItem, OrderItemSnapshot};
use crate::db::repository::order::{OrderScope, StatusNote};
use crate::db::repository::{
    AssignmentRepository, OrderRepository, ProductRepository, RiderRepository, VendorRepository,
    parse_id,
};
use crate::orders::{ids, policy, pricing};
use crate::orders::policy::{OrderAction, OrderRelation};
use shared::{
    AppError, AppResponse, AppResult, DeliveryType, OrderStatus, Page, PaymentStatus, UserRole, ok,
};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub status: Option<OrderStatus>,
    /// Admin only
    #[serde(default)]
    pub vendor_id: Option<String>,
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

#[derive(Debug, Deserialize)]
pub struct StatusPayload {
    pub status: OrderStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssignRiderPayload {
    /// Explicit rider; omitted means auto-assign
    #[serde(default)]
    pub rider_id: Option<String>,
}

/// Order with its line items
#[derive(Debug, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// POST /api/orders - 下单（买家）
pub async fn create(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<OrderCreate>,
) -> AppResult<impl IntoResponse> {
    if current.role != UserRole::Buyer {
        return Err(AppError::forbidden("Only buyers can place orders"));
    }
    if payload.items.is_empty() {
        return Err(AppError::validation("Order must contain at least one item"));
    }
    if payload.delivery_type == DeliveryType::Delivery
        && payload
            .delivery_address
            .as_deref()
            .map(str::trim)
            .unwrap_or("")
            .is_empty()
    {
        return Err(AppError::validation(
            "Delivery address is required for delivery orders",
        ));
    }

    let customer_id = parse_id("user", &current.id)?;
    let vendor = VendorRepository::new(state.db.clone())
        .find_by_id(&payload.vendor_id)
        .await?
        .filter(|v| v.is_active)
        .ok_or_else(|| AppError::not_found("Vendor not found"))?;
    let vendor_id = vendor
        .id
        .clone()
        .ok_or_else(|| AppError::internal("Vendor record without id"))?;

    // Resolve and price every line against the current catalog
    let product_repo = ProductRepository::new(state.db.clone());
    let mut subtotal = 0.0;
    let mut snapshots = Vec::with_capacity(payload.items.len());
    for item in &payload.items {
        if item.quantity <= 0 {
            return Err(AppError::validation("Item quantity must be positive"));
        }
        let product = product_repo
            .find_by_id(&item.product_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| {
                AppError::not_found(format!("Product {} not found", item.product_id))
            })?;
        if product.vendor != vendor_id {
            return Err(AppError::validation(format!(
                "Product {} does not belong to this vendor",
                product.name
            )));
        }
        pricing::ensure_stock(&product.name, product.stock_quantity, item.quantity)?;

        let total_price = pricing::line_total(product.price, item.quantity);
        subtotal += total_price;
        snapshots.push(OrderItemSnapshot {
            product: product
                .id
                .ok_or_else(|| AppError::internal("Product record without id"))?,
            product_name: product.name,
            quantity: item.quantity,
            unit_price: product.price,
            total_price,
            special_instructions: item.special_instructions.clone(),
        });
    }

    let schedule = pricing::FeeSchedule::from(&vendor);
    let quote = pricing::quote(
        subtotal,
        &schedule,
        payload.delivery_type,
        payload.discount_amount.unwrap_or(0.0),
        Local::now().hour(),
    )?;

    let now = Utc::now();
    let now_ms = now.timestamp_millis();
    let estimated = now + Duration::minutes(pricing::estimated_minutes(&schedule, payload.delivery_type));

    let order = Order {
        id: None,
        order_number: ids::generate_order_number(now.date_naive()),
        customer: customer_id,
        vendor: vendor_id,
        rider: None,
        status: OrderStatus::Pending,
        delivery_type: payload.delivery_type,
        subtotal: quote.subtotal,
        delivery_fee: quote.delivery_fee,
        service_fee: quote.service_fee,
        discount_amount: quote.discount_amount,
        total_amount: quote.total_amount,
        payment_status: PaymentStatus::Pending,
        payment_method: payload.payment_method,
        delivery_address: payload.delivery_address,
        delivery_instructions: payload.delivery_instructions,
        pickup_code: match payload.delivery_type {
            DeliveryType::Pickup => Some(ids::generate_pickup_code()),
            DeliveryType::Delivery => None,
        },
        vendor_notes: None,
        rider_notes: None,
        estimated_delivery_time: estimated.timestamp_millis(),
        preparation_started_at: None,
        ready_for_pickup_at: None,
        out_for_delivery_at: None,
        delivered_at: None,
        created_at: now_ms,
        updated_at: now_ms,
    };

    let repo = OrderRepository::new(state.db.clone());
    let order = repo.create_with_items(order, snapshots).await?;
    let items = match &order.id {
        Some(id) => repo.find_items(id).await?,
        None => Vec::new(),
    };

    tracing::info!(order_number = %order.order_number, "Order placed");
    Ok((StatusCode::CREATED, ok(OrderDetail { order, items })))
}

/// GET /api/orders - 订单列表（按角色限定可见范围）
pub async fn list(
    State(state): State<ServerState>,
    current: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<AppResponse<Page<Order>>>> {
    let scope = match current.role {
        UserRole::Admin => match &query.vendor_id {
            Some(vendor_id) => OrderScope::Vendor(parse_id("vendor", vendor_id)?),
            None => OrderScope::All,
        },
        UserRole::Buyer => OrderScope::Customer(parse_id("user", &current.id)?),
        UserRole::Vendor => {
            let vendor = own_vendor(&state, &current).await?;
            OrderScope::Vendor(
                vendor
                    .id
                    .ok_or_else(|| AppError::internal("Vendor record without id"))?,
            )
        }
        UserRole::Rider => {
            let rider = own_rider(&state, &current).await?;
            OrderScope::Rider(
                rider
                    .id
                    .ok_or_else(|| AppError::internal("Rider record without id"))?,
            )
        }
    };

    let per_page = query.per_page.clamp(1, 100);
    let repo = OrderRepository::new(state.db.clone());
    let (orders, total) = repo
        .find_page(scope, query.status, query.page, per_page)
        .await?;
    Ok(ok(Page::new(orders, total, per_page, query.page)))
}

/// GET /api/orders/:id - 订单详情（相关方或管理员）
pub async fn get_by_id(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<OrderDetail>>> {
    let repo = OrderRepository::new(state.db.clone());
    let order = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {id} not found")))?;

    let relation = resolve_relation(&state, &current, &order).await?;
    policy::check(current.role, relation, OrderAction::View)?;

    let items = match &order.id {
        Some(oid) => repo.find_items(oid).await?,
        None => Vec::new(),
    };
    Ok(ok(OrderDetail { order, items }))
}

/// PUT /api/orders/:id/status - 订单状态流转
pub async fn update_status(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<StatusPayload>,
) -> AppResult<Json<AppResponse<Order>>> {
    let repo = OrderRepository::new(state.db.clone());
    let order = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {id} not found")))?;

    let relation = resolve_relation(&state, &current, &order).await?;
    policy::check(
        current.role,
        relation,
        OrderAction::Transition {
            current: order.status,
            target: payload.status,
        },
    )?;

    let note = payload.notes.filter(|n| !n.trim().is_empty());
    let note = match current.role {
        UserRole::Vendor => note.map(StatusNote::Vendor),
        UserRole::Rider => note.map(StatusNote::Rider),
        // Admin notes land on the vendor side; buyers have no notes column
        UserRole::Admin => note.map(StatusNote::Vendor),
        UserRole::Buyer => None,
    };

    let order = repo.update_status(&order, payload.status, note).await?;
    tracing::info!(
        order_number = %order.order_number,
        status = order.status.as_str(),
        "Order status updated"
    );
    Ok(ok(order))
}

/// PUT /api/orders/:id/assign-rider - 指派或自动分配骑手
pub async fn assign_rider(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<AssignRiderPayload>,
) -> AppResult<Json<AppResponse<Order>>> {
    let repo = OrderRepository::new(state.db.clone());
    let order = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {id} not found")))?;

    let relation = resolve_relation(&state, &current, &order).await?;
    policy::check(current.role, relation, OrderAction::AssignRider)?;

    // Explicit mode takes any active, verified rider; the fleet
    // eligibility filter only applies to auto-assignment.
    let rider = match payload.rider_id {
        Some(rider_id) => RiderRepository::new(state.db.clone())
            .find_by_id(&rider_id)
            .await?
            .filter(|r| r.is_active && r.is_verified)
            .ok_or_else(|| AppError::not_found("Rider not found or not verified"))?,
        None => AssignmentRepository::new(state.db.clone())
            .eligible_rider(&order.vendor)
            .await?
            .ok_or_else(|| AppError::not_found("No available rider for this vendor"))?,
    };

    let rider_id = rider
        .id
        .ok_or_else(|| AppError::internal("Rider record without id"))?;
    let order = repo.assign_rider(&order, &rider_id).await?;
    tracing::info!(
        order_number = %order.order_number,
        rider = %rider_id,
        "Rider assigned"
    );
    Ok(ok(order))
}

/// GET /api/orders/analytics - 平台订单统计（仅管理员）
pub async fn analytics(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<AppResponse<Value>>> {
    if !current.is_admin() {
        return Err(AppError::forbidden("Admin access required"));
    }

    let mut result = state
        .db
        .query(
            r#"
            LET $orders = (SELECT status, total_amount, service_fee FROM order);
            LET $delivered = $orders[WHERE status = 'delivered'];
            SELECT * FROM order ORDER BY created_at DESC LIMIT 10;
            RETURN {
                total_orders: count($orders),
                delivered_orders: count($delivered),
                pending_orders: count($orders[WHERE status = 'pending']),
                cancelled_orders: count($orders[WHERE status = 'cancelled']),
                in_progress_orders: count($orders[WHERE status IN
                    ['confirmed', 'preparing', 'ready_for_pickup', 'out_for_delivery']]),
                total_revenue: math::sum($delivered.total_amount) OR 0,
                service_fee_revenue: math::sum($delivered.service_fee) OR 0,
                total_users: (SELECT count() AS c FROM user GROUP ALL)[0].c OR 0,
                total_vendors: (SELECT count() AS c FROM vendor
                    WHERE is_active = true GROUP ALL)[0].c OR 0,
                total_riders: (SELECT count() AS c FROM rider
                    WHERE is_active = true GROUP ALL)[0].c OR 0,
            };
            "#,
        )
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    let recent: Vec<Order> = result
        .take(2)
        .map_err(|e| AppError::database(e.to_string()))?;
    let stats: Option<Value> = result
        .take(3)
        .map_err(|e| AppError::database(e.to_string()))?;

    let mut stats = stats.unwrap_or_else(|| serde_json::json!({}));
    stats["recent_orders"] =
        serde_json::to_value(recent).map_err(|e| AppError::internal(e.to_string()))?;
    Ok(ok(stats))
}

async fn own_vendor(state: &ServerState, current: &CurrentUser) -> AppResult<crate::db::models::Vendor> {
    let user_id = parse_id("user", &current.id)?;
    VendorRepository::new(state.db.clone())
        .find_by_user(&user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Vendor profile not found"))
}

async fn own_rider(state: &ServerState, current: &CurrentUser) -> AppResult<crate::db::models::Rider> {
    let user_id = parse_id("user", &current.id)?;
    RiderRepository::new(state.db.clone())
        .find_by_user(&user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Rider profile not found"))
}

/// How the caller relates to the order, resolved against their profile
async fn resolve_relation(
    state: &ServerState,
    current: &CurrentUser,
    order: &Order,
) -> AppResult<OrderRelation> {
    let user_id = parse_id("user", &current.id)?;
    let mut relation = OrderRelation {
        is_customer: order.customer == user_id,
        ..Default::default()
    };

    match current.role {
        UserRole::Vendor => {
            if let Some(vendor) = VendorRepository::new(state.db.clone())
                .find_by_user(&user_id)
                .await?
            {
                relation.is_order_vendor = vendor.id.as_ref() == Some(&order.vendor);
            }
        }
        UserRole::Rider => {
            if let Some(rider) = RiderRepository::new(state.db.clone())
                .find_by_user(&user_id)
                .await?
            {
                relation.is_assigned_rider =
                    rider.id.is_some() && rider.id == order.rider;
            }
        }
        _ => {}
    }

    Ok(relation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtService;
    use crate::core::Config;
    use crate::db::DbService;
    use crate::db::models::Rider;
    use std::sync::Arc;
    use surrealdb::RecordId;

    async fn test_state(dir: &tempfile::TempDir) -> ServerState {
        let db_path = dir.path().join("test.db");
        let service = DbService::new(&db_path.to_string_lossy()).await.unwrap();
        let config = Config::with_overrides(dir.path().to_string_lossy(), 0);
        let jwt = Arc::new(JwtService::with_config(config.jwt.clone()));
        ServerState::new(config, service.db, jwt)
    }

    fn admin() -> CurrentUser {
        CurrentUser {
            id: "user:admin1".to_string(),
            email: "admin@example.com".to_string(),
            role: UserRole::Admin,
        }
    }

    fn order_row(
        number: &str,
        status: OrderStatus,
        delivery_type: DeliveryType,
        total: f64,
    ) -> Order {
        Order {
            id: None,
            order_number: number.to_string(),
            customer: parse_id("user", "buyer1").unwrap(),
            vendor: parse_id("vendor", "v1").unwrap(),
            rider: None,
            status,
            delivery_type,
            subtotal: total,
            delivery_fee: 0.0,
            service_fee: 0.0,
            discount_amount: 0.0,
            total_amount: total,
            payment_status: PaymentStatus::Pending,
            payment_method: None,
            delivery_address: None,
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

    fn rider_row(user_key: &str) -> Rider {
        Rider {
            id: None,
            user: parse_id("user", user_key).unwrap(),
            vehicle_type: None,
            license_number: None,
            vehicle_registration: None,
            is_active: true,
            is_available: true,
            is_verified: true,
            rating: 5.0,
            total_deliveries: 0,
            successful_deliveries: 0,
            current_latitude: None,
            current_longitude: None,
            last_location_update: None,
            created_at: 1,
            updated_at: 1,
        }
    }

    #[tokio::test]
    async fn test_admin_analytics_includes_recent_orders() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir).await;

        let _: Option<Order> = state
            .db
            .create("order")
            .content(order_row(
                "HO-20260101-EEEEEE",
                OrderStatus::Delivered,
                DeliveryType::Pickup,
                30.0,
            ))
            .await
            .unwrap();
        let _: Option<Order> = state
            .db
            .create("order")
            .content(order_row(
                "HO-20260101-FFFFFF",
                OrderStatus::Pending,
                DeliveryType::Pickup,
                10.0,
            ))
            .await
            .unwrap();

        let response = analytics(State(state), admin()).await.unwrap();
        let stats = response.0.data.unwrap();

        assert_eq!(stats["total_orders"].as_u64(), Some(2));
        assert_eq!(stats["total_revenue"].as_f64(), Some(30.0));
        assert_eq!(stats["recent_orders"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_explicit_assignment_takes_any_verified_rider() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir).await;

        // Verified rider with no fleet link, pickup order: explicit
        // assignment still goes through.
        let rider: Option<Rider> = state
            .db
            .create("rider")
            .content(rider_row("r1"))
            .await
            .unwrap();
        let rider_id = rider.unwrap().id.unwrap();

        let order: Option<Order> = state
            .db
            .create("order")
            .content(order_row(
                "HO-20260101-GGGGGG",
                OrderStatus::Pending,
                DeliveryType::Pickup,
                15.0,
            ))
            .await
            .unwrap();
        let order_id: RecordId = order.unwrap().id.unwrap();

        let response = assign_rider(
            State(state),
            admin(),
            Path(order_id.to_string()),
            Json(AssignRiderPayload {
                rider_id: Some(rider_id.to_string()),
            }),
        )
        .await
        .unwrap();

        let updated = response.0.data.unwrap();
        assert_eq!(updated.rider, Some(rider_id));
        // Assignment never moves the status
        assert_eq!(updated.status, OrderStatus::Pending);
    }
}
