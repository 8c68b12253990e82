use crate::{
    entities::order::{
        self, ActiveModel as OrderActiveModel, Entity as OrderEntity, Model as OrderModel,
        OrderStatus, PaymentStatus,
    },
    entities::order_item::{
        self, ActiveModel as OrderItemActiveModel, Entity as OrderItemEntity,
        Model as OrderItemModel,
    },
    entities::user::{self, ActiveModel as UserActiveModel, Entity as UserEntity},
    errors::ServiceError,
    events::{Event, EventSender},
    money,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

fn validate_non_negative_decimal(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.message = Some("Amount must not be negative".into());
        return Err(err);
    }
    Ok(())
}

/// One cart line as submitted by the storefront. `price` is the unit price in
/// major currency units (naira).
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateOrderItemRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    #[validate(custom = "validate_non_negative_decimal")]
    #[schema(value_type = String, example = "5000.00")]
    pub price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, message = "Order must contain at least one item"))]
    pub items: Vec<CreateOrderItemRequest>,
    /// Order total in major currency units (naira).
    #[validate(custom = "validate_non_negative_decimal")]
    #[schema(value_type = String, example = "10000.00")]
    pub total_amount: Decimal,
    /// Delivery fee in major currency units, defaults to zero.
    #[schema(value_type = Option<String>, example = "500.00")]
    pub delivery_fee: Option<Decimal>,
    #[validate(length(min = 1, message = "Delivery address is required"))]
    pub delivery_address: String,
    #[validate(length(min = 1, message = "Delivery city is required"))]
    pub delivery_city: String,
    #[validate(length(min = 1, message = "Delivery state is required"))]
    pub delivery_state: String,
    #[validate(length(min = 1, message = "Phone is required"))]
    pub phone: String,
    #[validate(email(message = "Email must be valid"))]
    pub email: String,
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    pub payment_method: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    /// Unit price snapshot in kobo.
    pub price: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_ref: Option<String>,
    pub payment_method: Option<String>,
    /// Kobo.
    pub total_amount: i64,
    /// Kobo.
    pub delivery_fee: i64,
    pub delivery_address: String,
    pub delivery_city: String,
    pub delivery_state: String,
    pub phone: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub items: Vec<OrderItemResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderListResponse {
    pub orders: Vec<OrderResponse>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderFilter {
    pub email: Option<String>,
    pub status: Option<OrderStatus>,
}

/// Derives the human-readable display code for an order from its uuid.
/// Uniqueness comes from the uuid plus the unique constraint on the column,
/// not from the timestamp prefix.
pub(crate) fn order_number_for(id: Uuid, created_at: DateTime<Utc>) -> String {
    let hex = id.simple().to_string();
    format!(
        "FS-{}-{}",
        created_at.format("%Y%m%d"),
        hex[..8].to_uppercase()
    )
}

#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<Arc<EventSender>>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self { db, event_sender }
    }

    /// Creates an order with its items, upserting the customer by email, in one
    /// transaction. Either the user, order and every item are all visible, or
    /// nothing is.
    #[instrument(skip(self, request), fields(email = %request.email, item_count = request.items.len()))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request.validate()?;
        for item in &request.items {
            item.validate()?;
        }

        let now = Utc::now();
        let order_id = Uuid::new_v4();
        let order_number = order_number_for(order_id, now);

        let total_amount = money::to_minor(request.total_amount)?;
        let delivery_fee = money::to_minor(request.delivery_fee.unwrap_or_default())?;
        let item_prices: Vec<i64> = request
            .items
            .iter()
            .map(|item| money::to_minor(item.price))
            .collect::<Result<_, _>>()?;

        let txn = self.db.begin().await.map_err(|e| {
            error!(error = %e, "failed to start transaction for order creation");
            ServiceError::DatabaseError(e)
        })?;

        let user = Self::upsert_user(&txn, &request, now).await?;

        let order_model = OrderActiveModel {
            id: Set(order_id),
            order_number: Set(order_number.clone()),
            user_id: Set(user.id),
            status: Set(OrderStatus::Pending.as_str().to_string()),
            payment_status: Set(PaymentStatus::Pending.as_str().to_string()),
            payment_ref: Set(None),
            payment_method: Set(request.payment_method.clone()),
            total_amount: Set(total_amount),
            delivery_fee: Set(delivery_fee),
            delivery_address: Set(request.delivery_address.clone()),
            delivery_city: Set(request.delivery_city.clone()),
            delivery_state: Set(request.delivery_state.clone()),
            phone: Set(request.phone.clone()),
            email: Set(request.email.clone()),
            first_name: Set(request.first_name.clone()),
            last_name: Set(request.last_name.clone()),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            error!(error = %e, %order_id, "failed to insert order");
            ServiceError::DatabaseError(e)
        })?;

        let mut items = Vec::with_capacity(request.items.len());
        for (line, price) in request.items.iter().zip(item_prices) {
            let item = OrderItemActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(line.product_id),
                quantity: Set(line.quantity),
                price: Set(price),
                created_at: Set(now),
            }
            .insert(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, %order_id, product_id = %line.product_id, "failed to insert order item");
                ServiceError::DatabaseError(e)
            })?;
            items.push(item);
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, %order_id, "failed to commit order creation");
            ServiceError::DatabaseError(e)
        })?;

        info!(%order_id, %order_number, "order created");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::OrderCreated(order_id)).await {
                warn!(error = %e, %order_id, "failed to send order created event");
            }
        }

        Self::model_to_response(order_model, items)
    }

    /// Looks up the customer by email, creating a guest record when absent.
    /// Guests carry no password hash; they are not credentialed accounts.
    async fn upsert_user<C: ConnectionTrait>(
        conn: &C,
        request: &CreateOrderRequest,
        now: DateTime<Utc>,
    ) -> Result<user::Model, ServiceError> {
        let existing = UserEntity::find()
            .filter(user::Column::Email.eq(request.email.as_str()))
            .one(conn)
            .await?;

        if let Some(user) = existing {
            return Ok(user);
        }

        let created = UserActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(request.email.clone()),
            password_hash: Set(None),
            first_name: Set(request.first_name.clone()),
            last_name: Set(request.last_name.clone()),
            phone: Set(Some(request.phone.clone())),
            address: Set(Some(request.delivery_address.clone())),
            city: Set(Some(request.delivery_city.clone())),
            state: Set(Some(request.delivery_state.clone())),
            role: Set("customer".to_string()),
            is_guest: Set(true),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(conn)
        .await
        .map_err(|e| {
            error!(error = %e, email = %request.email, "failed to create guest user");
            ServiceError::DatabaseError(e)
        })?;

        info!(user_id = %created.id, "guest user created for checkout");
        Ok(created)
    }

    /// Retrieves an order with its items.
    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderResponse, ServiceError> {
        let order = OrderEntity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {order_id} not found")))?;

        let items = order.find_related(OrderItemEntity).all(&*self.db).await?;
        Self::model_to_response(order, items)
    }

    /// Lists orders newest-first with optional email/status filters.
    #[instrument(skip(self, filter))]
    pub async fn list_orders(
        &self,
        filter: OrderFilter,
        page: u64,
        limit: u64,
    ) -> Result<OrderListResponse, ServiceError> {
        let page = page.max(1);
        let limit = limit.clamp(1, 100);

        let mut query = OrderEntity::find().order_by_desc(order::Column::CreatedAt);
        if let Some(email) = &filter.email {
            query = query.filter(order::Column::Email.eq(email.as_str()));
        }
        if let Some(status) = filter.status {
            query = query.filter(order::Column::Status.eq(status.as_str()));
        }

        let paginator = query.paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page - 1).await?;

        let mut responses = Vec::with_capacity(orders.len());
        for order in orders {
            let items = order.find_related(OrderItemEntity).all(&*self.db).await?;
            responses.push(Self::model_to_response(order, items)?);
        }

        Ok(OrderListResponse {
            orders: responses,
            total,
            page,
            limit,
            total_pages: total.div_ceil(limit),
        })
    }

    pub(crate) fn model_to_response(
        model: OrderModel,
        items: Vec<OrderItemModel>,
    ) -> Result<OrderResponse, ServiceError> {
        Ok(OrderResponse {
            id: model.id,
            order_number: model.order_number,
            user_id: model.user_id,
            status: OrderStatus::parse(&model.status)?,
            payment_status: PaymentStatus::parse(&model.payment_status)?,
            payment_ref: model.payment_ref,
            payment_method: model.payment_method,
            total_amount: model.total_amount,
            delivery_fee: model.delivery_fee,
            delivery_address: model.delivery_address,
            delivery_city: model.delivery_city,
            delivery_state: model.delivery_state,
            phone: model.phone,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            items: items
                .into_iter()
                .map(|item| OrderItemResponse {
                    id: item.id,
                    product_id: item.product_id,
                    quantity: item.quantity,
                    price: item.price,
                })
                .collect(),
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_request() -> CreateOrderRequest {
        CreateOrderRequest {
            items: vec![CreateOrderItemRequest {
                product_id: Uuid::new_v4(),
                quantity: 2,
                price: dec!(5000.00),
            }],
            total_amount: dec!(10000),
            delivery_fee: Some(dec!(0)),
            delivery_address: "12 Marina Rd".into(),
            delivery_city: "Lagos".into(),
            delivery_state: "Lagos".into(),
            phone: "+2348012345678".into(),
            email: "ada@example.com".into(),
            first_name: "Ada".into(),
            last_name: "Obi".into(),
            payment_method: Some("card".into()),
        }
    }

    #[test]
    fn empty_cart_fails_validation() {
        let mut request = sample_request();
        request.items.clear();
        assert!(request.validate().is_err());
    }

    #[test]
    fn zero_quantity_fails_validation() {
        let mut request = sample_request();
        request.items[0].quantity = 0;
        assert!(request.validate().is_err());
    }

    #[test]
    fn malformed_email_fails_validation() {
        let mut request = sample_request();
        request.email = "not-an-email".into();
        assert!(request.validate().is_err());
    }

    #[test]
    fn order_number_is_derived_from_uuid() {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let number = order_number_for(id, now);
        assert!(number.starts_with("FS-"));
        assert!(number.ends_with(&id.simple().to_string()[..8].to_uppercase()));
    }

    #[test]
    fn model_to_response_maps_all_fields() {
        let now = Utc::now();
        let order_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let model = OrderModel {
            id: order_id,
            order_number: "FS-20250901-ABCD1234".into(),
            user_id,
            status: "pending".into(),
            payment_status: "pending".into(),
            payment_ref: None,
            payment_method: Some("card".into()),
            total_amount: 1_000_000,
            delivery_fee: 0,
            delivery_address: "12 Marina Rd".into(),
            delivery_city: "Lagos".into(),
            delivery_state: "Lagos".into(),
            phone: "+2348012345678".into(),
            email: "ada@example.com".into(),
            first_name: "Ada".into(),
            last_name: "Obi".into(),
            created_at: now,
            updated_at: Some(now),
        };
        let item = OrderItemModel {
            id: Uuid::new_v4(),
            order_id,
            product_id: Uuid::new_v4(),
            quantity: 2,
            price: 500_000,
            created_at: now,
        };

        let response = OrderService::model_to_response(model, vec![item]).unwrap();
        assert_eq!(response.id, order_id);
        assert_eq!(response.status, OrderStatus::Pending);
        assert_eq!(response.payment_status, PaymentStatus::Pending);
        assert_eq!(response.total_amount, 1_000_000);
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].price, 500_000);
    }
}
