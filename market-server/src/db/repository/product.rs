//! Product Repository

use super::{BaseRepository, RepoError, RepoResult, parse_id};
use crate::db::models::{Product, ProductCreate, ProductUpdate};
use chrono::Utc;
use rand::Rng;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "product";

/// Filters for the public product listing
#[derive(Debug, Default, Clone)]
pub struct ProductFilter {
    pub category_id: Option<String>,
    pub vendor_id: Option<String>,
    pub search: Option<String>,
    pub featured: Option<bool>,
}

#[derive(Clone)]
pub struct ProductRepository {
    base: BaseRepository,
}

impl ProductRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find product by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Product>> {
        let thing: RecordId = parse_id(TABLE, id)?;
        let product: Option<Product> = self.base.db().select(thing).await?;
        Ok(product)
    }

    /// List active products with filters, newest first
    pub async fn find_page(
        &self,
        filter: ProductFilter,
        page: u64,
        per_page: u64,
    ) -> RepoResult<(Vec<Product>, u64)> {
        let category = match &filter.category_id {
            Some(id) => Some(parse_id("category", id)?),
            None => None,
        };
        let vendor = match &filter.vendor_id {
            Some(id) => Some(parse_id("vendor", id)?),
            None => None,
        };
        let search = filter.search.clone().unwrap_or_default();
        let start = (page.saturating_sub(1)) * per_page;

        const WHERE_CLAUSE: &str = r#"
            is_active = true
            AND ($category IS NONE OR category = $category)
            AND ($vendor IS NONE OR vendor = $vendor)
            AND ($featured IS NONE OR is_featured = $featured)
            AND ($search = "" OR string::lowercase(name) CONTAINS string::lowercase($search)
                 OR string::lowercase(description OR "") CONTAINS string::lowercase($search))
        "#;

        let mut result = self
            .base
            .db()
            .query(format!(
                r#"
                SELECT * FROM product WHERE {WHERE_CLAUSE}
                    ORDER BY created_at DESC LIMIT $limit START $start;
                SELECT count() AS total FROM product WHERE {WHERE_CLAUSE} GROUP ALL;
                "#
            ))
            .bind(("category", category))
            .bind(("vendor", vendor))
            .bind(("featured", filter.featured))
            .bind(("search", search))
            .bind(("limit", per_page))
            .bind(("start", start))
            .await?;

        let products: Vec<Product> = result.take(0)?;
        let total: Option<u64> = result.take((1, "total"))?;
        Ok((products, total.unwrap_or(0)))
    }

    /// Create a product for a vendor
    pub async fn create(&self, vendor_id: &RecordId, data: ProductCreate) -> RepoResult<Product> {
        let category: RecordId = parse_id("category", &data.category_id)?;
        let now = Utc::now().timestamp_millis();

        let sku = match data.sku {
            Some(sku) if !sku.is_empty() => sku,
            _ => generate_sku(vendor_id),
        };

        let product = Product {
            id: None,
            vendor: vendor_id.clone(),
            category,
            name: data.name,
            description: data.description,
            price: data.price,
            original_price: data.original_price,
            sku,
            barcode: data.barcode,
            weight: data.weight,
            unit: data.unit,
            stock_quantity: data.stock_quantity.unwrap_or(0),
            low_stock_threshold: data.low_stock_threshold.unwrap_or(10),
            is_active: true,
            is_featured: data.is_featured.unwrap_or(false),
            image_url: data.image_url,
            tags: data.tags.unwrap_or_default(),
            origin_country: data.origin_country,
            created_at: now,
            updated_at: now,
        };

        let created: Option<Product> = self
            .base
            .db()
            .create(TABLE)
            .content(product)
            .await
            .map_err(|e| {
                let msg = e.to_string();
                if msg.contains("product_sku") {
                    RepoError::Duplicate("SKU already in use".to_string())
                } else {
                    RepoError::Database(msg)
                }
            })?;
        created.ok_or_else(|| RepoError::Database("Failed to create product".to_string()))
    }

    /// Update a product
    pub async fn update(&self, id: &str, data: ProductUpdate) -> RepoResult<Product> {
        let thing: RecordId = parse_id(TABLE, id)?;
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))?;

        let category = match &data.category_id {
            Some(cid) => Some(parse_id("category", cid)?),
            None => None,
        };

        #[derive(serde::Serialize)]
        struct ProductUpdateDb {
            #[serde(skip_serializing_if = "Option::is_none")]
            category: Option<RecordId>,
            #[serde(skip_serializing_if = "Option::is_none")]
            name: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            description: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            price: Option<f64>,
            #[serde(skip_serializing_if = "Option::is_none")]
            original_price: Option<f64>,
            #[serde(skip_serializing_if = "Option::is_none")]
            barcode: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            weight: Option<f64>,
            #[serde(skip_serializing_if = "Option::is_none")]
            unit: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            stock_quantity: Option<i64>,
            #[serde(skip_serializing_if = "Option::is_none")]
            low_stock_threshold: Option<i64>,
            #[serde(skip_serializing_if = "Option::is_none")]
            is_featured: Option<bool>,
            #[serde(skip_serializing_if = "Option::is_none")]
            is_active: Option<bool>,
            #[serde(skip_serializing_if = "Option::is_none")]
            image_url: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            tags: Option<Vec<String>>,
            #[serde(skip_serializing_if = "Option::is_none")]
            origin_country: Option<String>,
            updated_at: i64,
        }

        let update_data = ProductUpdateDb {
            category,
            name: data.name,
            description: data.description,
            price: data.price,
            original_price: data.original_price,
            barcode: data.barcode,
            weight: data.weight,
            unit: data.unit,
            stock_quantity: data.stock_quantity,
            low_stock_threshold: data.low_stock_threshold,
            is_featured: data.is_featured,
            is_active: data.is_active,
            image_url: data.image_url,
            tags: data.tags,
            origin_country: data.origin_country,
            updated_at: Utc::now().timestamp_millis(),
        };

        let mut result = self
            .base
            .db()
            .query("UPDATE $thing MERGE $data RETURN AFTER")
            .bind(("thing", thing))
            .bind(("data", update_data))
            .await?;

        result
            .take::<Option<Product>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))
    }

    /// Soft delete a product
    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        let thing: RecordId = parse_id(TABLE, id)?;
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))?;

        self.base
            .db()
            .query("UPDATE $thing SET is_active = false, updated_at = $now")
            .bind(("thing", thing))
            .bind(("now", Utc::now().timestamp_millis()))
            .await?;
        Ok(true)
    }

    /// Active product count for a vendor
    pub async fn count_for_vendor(&self, vendor_id: &RecordId) -> RepoResult<i64> {
        let mut result = self
            .base
            .db()
            .query(
                "SELECT count() AS total FROM product WHERE vendor = $vendor AND is_active = true GROUP ALL",
            )
            .bind(("vendor", vendor_id.clone()))
            .await?;
        let total: Option<i64> = result.take((0, "total"))?;
        Ok(total.unwrap_or(0))
    }
}

/// `HO-<vendor-key>-<8 hex>`
fn generate_sku(vendor_id: &RecordId) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..8)
        .map(|_| format!("{:x}", rng.gen_range(0..16u8)))
        .collect();
    format!("HO-{}-{}", vendor_id.key(), suffix)
}
