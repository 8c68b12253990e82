use crate::{
    entities::product::{
        self, ActiveModel as ProductActiveModel, Entity as ProductEntity, Model as ProductModel,
    },
    errors::ServiceError,
    money,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 255, message = "Product name is required"))]
    pub name: String,
    #[validate(length(max = 2000, message = "Description cannot exceed 2000 characters"))]
    pub description: Option<String>,
    /// Price in major currency units (naira).
    #[schema(value_type = String, example = "5000.00")]
    pub price: Decimal,
    #[schema(value_type = Option<String>, example = "6500.00")]
    pub original_price: Option<Decimal>,
    pub category_id: Uuid,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub best_seller: bool,
    #[serde(default)]
    pub organic: bool,
    pub badge: Option<String>,
    #[serde(default)]
    pub stock_count: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 255, message = "Product name must not be empty"))]
    pub name: Option<String>,
    #[validate(length(max = 2000, message = "Description cannot exceed 2000 characters"))]
    pub description: Option<String>,
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub original_price: Option<Decimal>,
    pub category_id: Option<Uuid>,
    pub images: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub featured: Option<bool>,
    pub best_seller: Option<bool>,
    pub organic: Option<bool>,
    pub badge: Option<String>,
    pub stock_count: Option<i32>,
}

/// Browse-time predicate filters and comparator sorts.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct ProductFilter {
    pub category_id: Option<Uuid>,
    pub search: Option<String>,
    pub featured: Option<bool>,
    pub in_stock: Option<bool>,
    pub organic: Option<bool>,
    /// One of: price-low, price-high, name, featured (default).
    pub sort_by: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<ProductModel>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_product(
        &self,
        request: CreateProductRequest,
    ) -> Result<ProductModel, ServiceError> {
        request.validate()?;

        let now = Utc::now();
        let stock_count = request.stock_count.max(0);
        let original_price = request
            .original_price
            .map(money::to_minor)
            .transpose()?;

        let created = ProductActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            description: Set(request.description),
            price: Set(money::to_minor(request.price)?),
            original_price: Set(original_price),
            category_id: Set(request.category_id),
            images: Set(Some(json!(request.images))),
            tags: Set(Some(json!(request.tags))),
            featured: Set(request.featured),
            best_seller: Set(request.best_seller),
            organic: Set(request.organic),
            badge: Set(request.badge),
            stock_count: Set(stock_count),
            in_stock: Set(stock_count > 0),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(&*self.db)
        .await?;

        info!(product_id = %created.id, "product created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, product_id: Uuid) -> Result<ProductModel, ServiceError> {
        ProductEntity::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {product_id} not found")))
    }

    #[instrument(skip(self, filter))]
    pub async fn list_products(
        &self,
        filter: ProductFilter,
        page: u64,
        limit: u64,
    ) -> Result<ProductListResponse, ServiceError> {
        let page = page.max(1);
        let limit = limit.clamp(1, 100);

        let mut query = ProductEntity::find();
        if let Some(category_id) = filter.category_id {
            query = query.filter(product::Column::CategoryId.eq(category_id));
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", search.trim());
            query = query.filter(
                Condition::any()
                    .add(product::Column::Name.like(pattern.clone()))
                    .add(product::Column::Description.like(pattern)),
            );
        }
        if let Some(featured) = filter.featured {
            query = query.filter(product::Column::Featured.eq(featured));
        }
        if let Some(in_stock) = filter.in_stock {
            query = query.filter(product::Column::InStock.eq(in_stock));
        }
        if let Some(organic) = filter.organic {
            query = query.filter(product::Column::Organic.eq(organic));
        }

        query = match filter.sort_by.as_deref() {
            Some("price-low") => query.order_by_asc(product::Column::Price),
            Some("price-high") => query.order_by_desc(product::Column::Price),
            Some("name") => query.order_by_asc(product::Column::Name),
            _ => query
                .order_by_desc(product::Column::Featured)
                .order_by_desc(product::Column::BestSeller)
                .order_by_desc(product::Column::CreatedAt),
        };

        let paginator = query.paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(page - 1).await?;

        Ok(ProductListResponse {
            products,
            total,
            page,
            limit,
            total_pages: total.div_ceil(limit),
        })
    }

    /// Applies a partial update, re-deriving `in_stock` whenever the stock
    /// count changes.
    #[instrument(skip(self, request))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        request: UpdateProductRequest,
    ) -> Result<ProductModel, ServiceError> {
        request.validate()?;

        let existing = self.get_product(product_id).await?;
        let mut active: ProductActiveModel = existing.into();

        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }
        if let Some(price) = request.price {
            active.price = Set(money::to_minor(price)?);
        }
        if let Some(original_price) = request.original_price {
            active.original_price = Set(Some(money::to_minor(original_price)?));
        }
        if let Some(category_id) = request.category_id {
            active.category_id = Set(category_id);
        }
        if let Some(images) = request.images {
            active.images = Set(Some(json!(images)));
        }
        if let Some(tags) = request.tags {
            active.tags = Set(Some(json!(tags)));
        }
        if let Some(featured) = request.featured {
            active.featured = Set(featured);
        }
        if let Some(best_seller) = request.best_seller {
            active.best_seller = Set(best_seller);
        }
        if let Some(organic) = request.organic {
            active.organic = Set(organic);
        }
        if let Some(badge) = request.badge {
            active.badge = Set(Some(badge));
        }
        if let Some(stock_count) = request.stock_count {
            let stock_count = stock_count.max(0);
            active.stock_count = Set(stock_count);
            active.in_stock = Set(stock_count > 0);
        }
        active.updated_at = Set(Some(Utc::now()));

        Ok(active.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: Uuid) -> Result<(), ServiceError> {
        let result = ProductEntity::delete_by_id(product_id)
            .exec(&*self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Product {product_id} not found"
            )));
        }
        info!(%product_id, "product deleted");
        Ok(())
    }
}
