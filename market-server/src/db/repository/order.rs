//! Order Repository
//!
//! Order creation and status transitions run as single SurrealDB
//! transactions so stock decrements, status stamps, and counter side
//! effects commit or roll back together.

use super::{BaseRepository, RepoError, RepoResult, parse_id};
use crate::db::models::{Order, OrderItem, OrderItemSnapshot};
use crate::orders::status;
use chrono::Utc;
use shared::OrderStatus;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "order";

/// Listing scope derived from the caller's role
#[derive(Debug, Clone)]
pub enum OrderScope {
    All,
    Customer(RecordId),
    Vendor(RecordId),
    Rider(RecordId),
}

/// Which notes column a transition note lands in
#[derive(Debug, Clone)]
pub enum StatusNote {
    Vendor(String),
    Rider(String),
}

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find order by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Order>> {
        let thing: RecordId = parse_id(TABLE, id)?;
        let order: Option<Order> = self.base.db().select(thing).await?;
        Ok(order)
    }

    /// Find order by its public order number
    pub async fn find_by_number(&self, order_number: &str) -> RepoResult<Option<Order>> {
        let number = order_number.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM order WHERE order_number = $number LIMIT 1")
            .bind(("number", number))
            .await?;
        let orders: Vec<Order> = result.take(0)?;
        Ok(orders.into_iter().next())
    }

    /// Line items for an order, in insertion order
    pub async fn find_items(&self, order_id: &RecordId) -> RepoResult<Vec<OrderItem>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM order_item WHERE order = $order ORDER BY id ASC")
            .bind(("order", order_id.clone()))
            .await?;
        let items: Vec<OrderItem> = result.take(0)?;
        Ok(items)
    }

    /// List orders visible to the caller, newest first
    pub async fn find_page(
        &self,
        scope: OrderScope,
        status_filter: Option<OrderStatus>,
        page: u64,
        per_page: u64,
    ) -> RepoResult<(Vec<Order>, u64)> {
        let (customer, vendor, rider) = match scope {
            OrderScope::All => (None, None, None),
            OrderScope::Customer(id) => (Some(id), None, None),
            OrderScope::Vendor(id) => (None, Some(id), None),
            OrderScope::Rider(id) => (None, None, Some(id)),
        };
        let start = (page.saturating_sub(1)) * per_page;

        const WHERE_CLAUSE: &str = r#"
            ($customer IS NONE OR customer = $customer)
            AND ($vendor IS NONE OR vendor = $vendor)
            AND ($rider IS NONE OR rider = $rider)
            AND ($status IS NONE OR status = $status)
        "#;

        let mut result = self
            .base
            .db()
            .query(format!(
                r#"
                SELECT * FROM order WHERE {WHERE_CLAUSE}
                    ORDER BY created_at DESC LIMIT $limit START $start;
                SELECT count() AS total FROM order WHERE {WHERE_CLAUSE} GROUP ALL;
                "#
            ))
            .bind(("customer", customer))
            .bind(("vendor", vendor))
            .bind(("rider", rider))
            .bind(("status", status_filter))
            .bind(("limit", per_page))
            .bind(("start", start))
            .await?;

        let orders: Vec<Order> = result.take(0)?;
        let total: Option<u64> = result.take((1, "total"))?;
        Ok((orders, total.unwrap_or(0)))
    }

    /// Create an order with its line items, decrementing stock atomically.
    ///
    /// Each decrement is guarded by `stock_quantity >= quantity` in the
    /// UPDATE itself, so a concurrent order for the last units makes this
    /// transaction throw and roll back rather than drive stock negative.
    pub async fn create_with_items(
        &self,
        order: Order,
        items: Vec<OrderItemSnapshot>,
    ) -> RepoResult<Order> {
        if items.is_empty() {
            return Err(RepoError::Validation(
                "Order must contain at least one item".to_string(),
            ));
        }
        let order_number = order.order_number.clone();
        let now = order.created_at;

        let mut script = String::from("BEGIN TRANSACTION;\n");
        for i in 0..items.len() {
            // $avail is read before the decrement so the THROW payload can
            // name the quantity the loser actually observed.
            script.push_str(&format!(
                r#"
                LET $avail{i} = (SELECT VALUE stock_quantity FROM ONLY $pid{i}) OR 0;
                LET $upd{i} = UPDATE product
                    SET stock_quantity -= $qty{i}, updated_at = $now
                    WHERE id = $pid{i} AND is_active = true AND stock_quantity >= $qty{i};
                IF count($upd{i}) == 0 {{
                    THROW "INSUFFICIENT_STOCK|" + $name{i} + "|" + <string>$avail{i} + "|" + <string>$qty{i}
                }};
                "#
            ));
        }
        script.push_str("LET $created = (CREATE order CONTENT $order);\n");
        script.push_str("LET $oid = $created[0].id;\n");
        for i in 0..items.len() {
            script.push_str(&format!(
                r#"
                CREATE order_item CONTENT {{
                    order: $oid,
                    product: $pid{i},
                    product_name: $name{i},
                    quantity: $qty{i},
                    unit_price: $unit{i},
                    total_price: $line{i},
                    special_instructions: $si{i}
                }};
                "#
            ));
        }
        script.push_str("COMMIT TRANSACTION;");

        let mut query = self.base.db().query(script);
        query = query.bind(("order", order)).bind(("now", now));
        for (i, item) in items.into_iter().enumerate() {
            query = query
                .bind((format!("pid{i}"), item.product))
                .bind((format!("name{i}"), item.product_name))
                .bind((format!("qty{i}"), item.quantity))
                .bind((format!("unit{i}"), item.unit_price))
                .bind((format!("line{i}"), item.total_price))
                .bind((format!("si{i}"), item.special_instructions));
        }

        let result = query.await?;
        result.check().map_err(map_order_throw)?;

        self.find_by_number(&order_number)
            .await?
            .ok_or_else(|| RepoError::Database("Order vanished after commit".to_string()))
    }

    /// Apply a validated status transition.
    ///
    /// The UPDATE is fenced on the status the caller read, so two racing
    /// transitions cannot both win. Delivery side effects (payment
    /// completion, vendor and rider counters) ride the same transaction.
    pub async fn update_status(
        &self,
        order: &Order,
        target: OrderStatus,
        note: Option<StatusNote>,
    ) -> RepoResult<Order> {
        let order_id = order
            .id
            .clone()
            .ok_or_else(|| RepoError::Database("Order record without id".to_string()))?;
        let now = Utc::now().timestamp_millis();

        let mut set_clauses = String::from("status = $target, updated_at = $now");
        if let Some(column) = status::stamp_column(target) {
            set_clauses.push_str(&format!(", {column} = $now"));
        }
        if target == OrderStatus::Delivered {
            set_clauses.push_str(", payment_status = 'completed'");
        }
        match &note {
            Some(StatusNote::Vendor(_)) => set_clauses.push_str(", vendor_notes = $note"),
            Some(StatusNote::Rider(_)) => set_clauses.push_str(", rider_notes = $note"),
            None => {}
        }

        let mut script = format!(
            r#"
            BEGIN TRANSACTION;
            LET $updated = UPDATE $order_id SET {set_clauses} WHERE status = $expected;
            IF count($updated) == 0 {{ THROW "STATUS_CONFLICT" }};
            "#
        );
        if target == OrderStatus::Delivered {
            script.push_str(
                "UPDATE $vendor_id SET total_orders += 1, updated_at = $now;\n",
            );
            if order.rider.is_some() {
                script.push_str(
                    "UPDATE $rider_id SET total_deliveries += 1, successful_deliveries += 1, updated_at = $now;\n",
                );
            }
        }
        script.push_str("COMMIT TRANSACTION;");

        let note_text = note.map(|n| match n {
            StatusNote::Vendor(text) | StatusNote::Rider(text) => text,
        });

        let mut query = self
            .base
            .db()
            .query(script)
            .bind(("order_id", order_id.clone()))
            .bind(("target", target))
            .bind(("expected", order.status))
            .bind(("now", now))
            .bind(("note", note_text));
        if target == OrderStatus::Delivered {
            query = query.bind(("vendor_id", order.vendor.clone()));
            if let Some(rider_id) = order.rider.clone() {
                query = query.bind(("rider_id", rider_id));
            }
        }

        let result = query.await?;
        result.check().map_err(map_order_throw)?;

        let updated: Option<Order> = self.base.db().select(order_id).await?;
        updated.ok_or_else(|| RepoError::Database("Order vanished after update".to_string()))
    }

    /// Attach a rider to an order
    pub async fn assign_rider(&self, order: &Order, rider_id: &RecordId) -> RepoResult<Order> {
        let order_id = order
            .id
            .clone()
            .ok_or_else(|| RepoError::Database("Order record without id".to_string()))?;

        let mut result = self
            .base
            .db()
            .query("UPDATE $order_id SET rider = $rider, updated_at = $now RETURN AFTER")
            .bind(("order_id", order_id))
            .bind(("rider", rider_id.clone()))
            .bind(("now", Utc::now().timestamp_millis()))
            .await?;

        result
            .take::<Option<Order>>(0)?
            .ok_or_else(|| RepoError::NotFound("Order not found".to_string()))
    }
}

/// Map THROW markers from order transactions onto repository errors
fn map_order_throw(err: surrealdb::Error) -> RepoError {
    let msg = err.to_string();
    if let Some(stock) = parse_stock_marker(&msg) {
        stock
    } else if msg.contains("STATUS_CONFLICT") {
        RepoError::Conflict("Order status changed concurrently, retry".to_string())
    } else {
        RepoError::Database(msg)
    }
}

/// Parse the `INSUFFICIENT_STOCK|name|available|requested` marker thrown
/// by the creation transaction into the same message shape the pre-check
/// produces.
fn parse_stock_marker(msg: &str) -> Option<RepoError> {
    const MARKER: &str = "INSUFFICIENT_STOCK|";
    let pos = msg.find(MARKER)?;
    let mut parts = msg[pos + MARKER.len()..].split('|');
    let name = parts.next().unwrap_or_default().trim().to_string();
    let available = leading_number(parts.next().unwrap_or_default());
    let requested = leading_number(parts.next().unwrap_or_default());
    Some(RepoError::Stock(format!(
        "Insufficient stock for {name}: {available} available, {requested} requested"
    )))
}

/// The thrown string comes back embedded in the engine's error text, so
/// the numeric fields may carry trailing punctuation.
fn leading_number(s: &str) -> i64 {
    let digits: String = s
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::db::models::{Product, Rider, Vendor};
    use shared::{DeliveryType, PaymentStatus};

    #[test]
    fn test_stock_marker_carries_available_and_requested() {
        let err = parse_stock_marker(
            "An error occurred: INSUFFICIENT_STOCK|Organic Milk|2|5",
        )
        .unwrap();
        match err {
            RepoError::Stock(msg) => {
                assert_eq!(msg, "Insufficient stock for Organic Milk: 2 available, 5 requested");
            }
            other => panic!("expected Stock, got {other:?}"),
        }
    }

    #[test]
    fn test_stock_marker_ignores_trailing_punctuation() {
        let err = parse_stock_marker("INSUFFICIENT_STOCK|Eggs|0|12\"").unwrap();
        match err {
            RepoError::Stock(msg) => {
                assert_eq!(msg, "Insufficient stock for Eggs: 0 available, 12 requested");
            }
            other => panic!("expected Stock, got {other:?}"),
        }
    }

    async fn open_db(dir: &tempfile::TempDir) -> Surreal<Db> {
        let db_path = dir.path().join("test.db");
        DbService::new(&db_path.to_string_lossy()).await.unwrap().db
    }

    async fn create_product(db: &Surreal<Db>, name: &str, stock: i64) -> Product {
        let product = Product {
            id: None,
            vendor: parse_id("vendor", "v1").unwrap(),
            category: parse_id("category", "c1").unwrap(),
            name: name.to_string(),
            description: None,
            price: 2.5,
            original_price: None,
            sku: format!("SKU-{name}"),
            barcode: None,
            weight: None,
            unit: None,
            stock_quantity: stock,
            low_stock_threshold: 1,
            is_active: true,
            is_featured: false,
            image_url: None,
            tags: Vec::new(),
            origin_country: None,
            created_at: 1,
            updated_at: 1,
        };
        let created: Option<Product> = db.create("product").content(product).await.unwrap();
        created.unwrap()
    }

    fn snapshot(product: &Product, quantity: i64) -> OrderItemSnapshot {
        OrderItemSnapshot {
            product: product.id.clone().unwrap(),
            product_name: product.name.clone(),
            quantity,
            unit_price: product.price,
            total_price: product.price * quantity as f64,
            special_instructions: None,
        }
    }

    fn order_row(number: &str, status: OrderStatus) -> Order {
        Order {
            id: None,
            order_number: number.to_string(),
            customer: parse_id("user", "buyer1").unwrap(),
            vendor: parse_id("vendor", "v1").unwrap(),
            rider: None,
            status,
            delivery_type: DeliveryType::Delivery,
            subtotal: 5.0,
            delivery_fee: 3.0,
            service_fee: 0.25,
            discount_amount: 0.0,
            total_amount: 8.25,
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

    async fn stock_of(db: &Surreal<Db>, product: &Product) -> i64 {
        let found: Option<Product> = db
            .select(product.id.clone().unwrap())
            .await
            .unwrap();
        found.unwrap().stock_quantity
    }

    #[tokio::test]
    async fn test_create_decrements_stock_and_stores_items() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_db(&dir).await;
        let repo = OrderRepository::new(db.clone());

        let milk = create_product(&db, "Milk", 5).await;
        let order = repo
            .create_with_items(order_row("HO-20260101-000001", OrderStatus::Pending), vec![
                snapshot(&milk, 2),
            ])
            .await
            .unwrap();

        assert_eq!(stock_of(&db, &milk).await, 3);
        let items = repo.find_items(order.id.as_ref().unwrap()).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[0].product_name, "Milk");
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back_the_whole_order() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_db(&dir).await;
        let repo = OrderRepository::new(db.clone());

        let bread = create_product(&db, "Bread", 10).await;
        let eggs = create_product(&db, "Eggs", 1).await;

        let err = repo
            .create_with_items(order_row("HO-20260101-000002", OrderStatus::Pending), vec![
                snapshot(&bread, 1),
                snapshot(&eggs, 5),
            ])
            .await
            .unwrap_err();

        match err {
            RepoError::Stock(msg) => {
                assert!(msg.contains("Eggs"), "unexpected message: {msg}");
                assert!(msg.contains("1 available, 5 requested"), "unexpected message: {msg}");
            }
            other => panic!("expected Stock, got {other:?}"),
        }

        // The first decrement rolled back with the rest
        assert_eq!(stock_of(&db, &bread).await, 10);
        assert_eq!(stock_of(&db, &eggs).await, 1);
        assert!(
            repo.find_by_number("HO-20260101-000002")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_second_order_loses_the_last_unit() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_db(&dir).await;
        let repo = OrderRepository::new(db.clone());

        let cake = create_product(&db, "Cake", 1).await;

        repo.create_with_items(order_row("HO-20260101-000003", OrderStatus::Pending), vec![
            snapshot(&cake, 1),
        ])
        .await
        .unwrap();

        // The loser sees the already-decremented quantity, never -1
        let err = repo
            .create_with_items(order_row("HO-20260101-000004", OrderStatus::Pending), vec![
                snapshot(&cake, 1),
            ])
            .await
            .unwrap_err();
        match err {
            RepoError::Stock(msg) => {
                assert!(msg.contains("0 available, 1 requested"), "unexpected message: {msg}");
            }
            other => panic!("expected Stock, got {other:?}"),
        }
        assert_eq!(stock_of(&db, &cake).await, 0);
    }

    #[tokio::test]
    async fn test_delivered_side_effects_apply_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_db(&dir).await;
        let repo = OrderRepository::new(db.clone());

        let vendor: Option<Vendor> = db
            .create("vendor")
            .content(Vendor {
                id: None,
                user: parse_id("user", "v-owner").unwrap(),
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
                rating: 4.0,
                total_orders: 0,
                created_at: 1,
                updated_at: 1,
            })
            .await
            .unwrap();
        let vendor = vendor.unwrap();

        let rider: Option<Rider> = db
            .create("rider")
            .content(Rider {
                id: None,
                user: parse_id("user", "r-owner").unwrap(),
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
            })
            .await
            .unwrap();
        let rider = rider.unwrap();

        let mut row = order_row("HO-20260101-000005", OrderStatus::OutForDelivery);
        row.vendor = vendor.id.clone().unwrap();
        row.rider = rider.id.clone();
        let order: Option<Order> = db.create("order").content(row).await.unwrap();
        let order = order.unwrap();

        let delivered = repo
            .update_status(&order, OrderStatus::Delivered, None)
            .await
            .unwrap();
        assert_eq!(delivered.status, OrderStatus::Delivered);
        assert_eq!(delivered.payment_status, PaymentStatus::Completed);
        assert!(delivered.delivered_at.is_some());

        let vendor_after: Option<Vendor> = db.select(vendor.id.clone().unwrap()).await.unwrap();
        assert_eq!(vendor_after.unwrap().total_orders, 1);
        let rider_after: Option<Rider> = db.select(rider.id.clone().unwrap()).await.unwrap();
        let rider_after = rider_after.unwrap();
        assert_eq!(rider_after.total_deliveries, 1);
        assert_eq!(rider_after.successful_deliveries, 1);

        // Replaying with the stale pre-delivery row hits the status fence
        // and leaves the counters alone.
        let err = repo
            .update_status(&order, OrderStatus::Delivered, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Conflict(_)));

        let vendor_after: Option<Vendor> = db.select(vendor.id.unwrap()).await.unwrap();
        assert_eq!(vendor_after.unwrap().total_orders, 1);
        let rider_after: Option<Rider> = db.select(rider.id.unwrap()).await.unwrap();
        assert_eq!(rider_after.unwrap().total_deliveries, 1);
    }
}
