//! Order settlement: payment initialization, verification and stock
//! reconciliation. This is the only place monetary and inventory invariants
//! are enforced.

use crate::{
    entities::order::{
        self, ActiveModel as OrderActiveModel, Entity as OrderEntity, Model as OrderModel,
        OrderStatus, PaymentStatus,
    },
    entities::order_item::Entity as OrderItemEntity,
    entities::product::{self, Entity as ProductEntity},
    errors::ServiceError,
    events::{Event, EventSender},
    payments::{InitializeData, InitializeRequest, PaymentGateway, TransactionMetadata, VerifyData},
    services::orders::{OrderResponse, OrderService},
};
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, ModelTrait, QueryFilter, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct InitializePaymentRequest {
    pub order_id: Uuid,
    #[validate(email(message = "Email must be valid"))]
    pub email: String,
    /// Amount in kobo. Must equal the order total plus delivery fee.
    #[schema(example = 1000000)]
    pub amount: i64,
    pub callback_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct VerifyPaymentRequest {
    #[validate(length(min = 1, message = "Payment reference is required"))]
    pub reference: String,
}

/// Settled order plus the gateway's authoritative payment payload.
#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyPaymentResponse {
    pub order: OrderResponse,
    pub payment: VerifyData,
}

/// Orchestrates the create -> initialize -> verify -> reconcile sequence
/// against an injected payment gateway.
#[derive(Clone)]
pub struct SettlementService {
    db: Arc<DatabaseConnection>,
    gateway: Arc<dyn PaymentGateway>,
    event_sender: Option<Arc<EventSender>>,
    default_callback_url: Option<String>,
}

impl SettlementService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        gateway: Arc<dyn PaymentGateway>,
        event_sender: Option<Arc<EventSender>>,
        default_callback_url: Option<String>,
    ) -> Self {
        Self {
            db,
            gateway,
            event_sender,
            default_callback_url,
        }
    }

    /// Initializes a gateway transaction for an order and stamps the payment
    /// reference on it. Re-initializing an unpaid order replaces the stored
    /// reference; a settled order cannot be re-initialized.
    #[instrument(skip(self, request), fields(order_id = %request.order_id))]
    pub async fn initialize_payment(
        &self,
        request: InitializePaymentRequest,
    ) -> Result<InitializeData, ServiceError> {
        request.validate()?;

        let order = OrderEntity::find_by_id(request.order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Order {} not found", request.order_id))
            })?;

        if PaymentStatus::parse(&order.payment_status)? == PaymentStatus::Paid {
            return Err(ServiceError::Conflict(format!(
                "Order {} is already paid",
                order.order_number
            )));
        }

        let expected = order.total_amount + order.delivery_fee;
        if request.amount != expected {
            return Err(ServiceError::ValidationError(format!(
                "Amount {} does not match order total {} kobo",
                request.amount, expected
            )));
        }

        let reference = payment_reference(&order.order_number, Utc::now().timestamp_millis());

        let init = self
            .gateway
            .initialize(InitializeRequest {
                email: request.email.clone(),
                amount: request.amount,
                reference: reference.clone(),
                callback_url: request
                    .callback_url
                    .clone()
                    .or_else(|| self.default_callback_url.clone()),
                metadata: TransactionMetadata {
                    order_number: order.order_number.clone(),
                    customer_name: format!("{} {}", order.first_name, order.last_name),
                },
            })
            .await?;

        // Only a successful gateway call mutates the order.
        let order_id = order.id;
        let mut active: OrderActiveModel = order.into();
        active.payment_ref = Set(Some(reference.clone()));
        active.payment_status = Set(PaymentStatus::Pending.as_str().to_string());
        active.updated_at = Set(Some(Utc::now()));
        active.update(&*self.db).await.map_err(|e| {
            error!(error = %e, %order_id, "failed to stamp payment reference");
            ServiceError::DatabaseError(e)
        })?;

        info!(%order_id, %reference, "payment initialized");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::PaymentInitialized {
                    order_id,
                    reference: reference.clone(),
                })
                .await
            {
                warn!(error = %e, %order_id, "failed to send payment initialized event");
            }
        }

        Ok(init)
    }

    /// Verifies a payment with the gateway and settles the order.
    ///
    /// The gateway's verify response is the sole source of truth; a
    /// client-supplied success flag is never trusted. Settlement (paid
    /// transition + stock decrement) happens in one transaction guarded by a
    /// conditional update, so a duplicate verify for the same reference is a
    /// safe no-op that returns the already-settled order.
    #[instrument(skip(self, request), fields(reference = %request.reference))]
    pub async fn verify_payment(
        &self,
        request: VerifyPaymentRequest,
    ) -> Result<VerifyPaymentResponse, ServiceError> {
        request.validate()?;
        let reference = request.reference.as_str();

        let verification = self.gateway.verify(reference).await?;

        let order = OrderEntity::find()
            .filter(order::Column::PaymentRef.eq(reference))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("No order for payment reference {reference}"))
            })?;

        if !verification.is_success() {
            return self.record_failure(order, verification).await;
        }

        // Amounts are stored in kobo and the gateway reports kobo; compare
        // directly, no rescaling. A mismatch is a hard stop and must never
        // mark the order paid.
        let expected = order.total_amount + order.delivery_fee;
        if verification.amount != expected {
            error!(
                order_id = %order.id,
                expected,
                paid = verification.amount,
                "payment amount mismatch"
            );
            return Err(ServiceError::PaymentAmountMismatch {
                expected,
                paid: verification.amount,
            });
        }

        let order_id = order.id;
        let txn = self.db.begin().await?;

        // Compare-and-set terminal transition. Zero rows affected means another
        // call already settled this order; skip reconciliation entirely.
        let update = OrderEntity::update_many()
            .col_expr(
                order::Column::PaymentStatus,
                Expr::value(PaymentStatus::Paid.as_str()),
            )
            .col_expr(
                order::Column::Status,
                Expr::value(OrderStatus::Confirmed.as_str()),
            )
            .col_expr(order::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::PaymentStatus.ne(PaymentStatus::Paid.as_str()))
            .exec(&txn)
            .await?;

        let mut depleted = Vec::new();
        if update.rows_affected == 1 {
            depleted = Self::reconcile_stock(&txn, &order).await?;
        } else {
            info!(%order_id, "order already settled; verification is a no-op");
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, %order_id, "failed to commit settlement");
            ServiceError::DatabaseError(e)
        })?;

        if update.rows_affected == 1 {
            info!(%order_id, amount = verification.amount, "payment verified and order settled");
            if let Some(event_sender) = &self.event_sender {
                if let Err(e) = event_sender
                    .send(Event::PaymentConfirmed {
                        order_id,
                        reference: reference.to_string(),
                        amount: verification.amount,
                    })
                    .await
                {
                    warn!(error = %e, %order_id, "failed to send payment confirmed event");
                }
                for product_id in depleted {
                    if let Err(e) = event_sender.send(Event::ProductOutOfStock(product_id)).await
                    {
                        warn!(error = %e, %product_id, "failed to send out-of-stock event");
                    }
                }
            }
        }

        let settled = OrderEntity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {order_id} not found")))?;
        let items = settled.find_related(OrderItemEntity).all(&*self.db).await?;

        Ok(VerifyPaymentResponse {
            order: OrderService::model_to_response(settled, items)?,
            payment: verification,
        })
    }

    /// Decrements stock for every line item and re-derives `in_stock` in the
    /// same transaction as the paid transition. Returns products that hit zero.
    async fn reconcile_stock(
        txn: &DatabaseTransaction,
        order: &OrderModel,
    ) -> Result<Vec<Uuid>, ServiceError> {
        let items = order.find_related(OrderItemEntity).all(txn).await?;

        let mut depleted = Vec::new();
        for item in items {
            ProductEntity::update_many()
                .col_expr(
                    product::Column::StockCount,
                    Expr::col(product::Column::StockCount).sub(item.quantity),
                )
                .filter(product::Column::Id.eq(item.product_id))
                .exec(txn)
                .await?;

            // in_stock is derived state: keep it consistent with stock_count.
            ProductEntity::update_many()
                .col_expr(
                    product::Column::InStock,
                    Expr::col(product::Column::StockCount).gt(0).into(),
                )
                .filter(product::Column::Id.eq(item.product_id))
                .exec(txn)
                .await?;

            let updated = ProductEntity::find_by_id(item.product_id).one(txn).await?;
            if let Some(product) = updated {
                if product.stock_count <= 0 {
                    depleted.push(product.id);
                }
            }
        }
        Ok(depleted)
    }

    /// Records a gateway-reported failure. The paid state is terminal: a late
    /// or duplicate failure report can never downgrade a settled order.
    async fn record_failure(
        &self,
        order: OrderModel,
        verification: VerifyData,
    ) -> Result<VerifyPaymentResponse, ServiceError> {
        let order_id = order.id;
        let reference = verification.reference.clone();

        OrderEntity::update_many()
            .col_expr(
                order::Column::PaymentStatus,
                Expr::value(PaymentStatus::Failed.as_str()),
            )
            .col_expr(order::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::PaymentStatus.ne(PaymentStatus::Paid.as_str()))
            .exec(&*self.db)
            .await?;

        warn!(
            %order_id,
            status = %verification.status,
            "gateway reported unsuccessful payment"
        );

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::PaymentFailed {
                    order_id,
                    reference,
                })
                .await
            {
                warn!(error = %e, %order_id, "failed to send payment failed event");
            }
        }

        Err(ServiceError::PaymentFailed(
            verification
                .gateway_response
                .unwrap_or_else(|| verification.status),
        ))
    }
}

/// Gateway reference for one payment attempt: unique per attempt because of
/// the millisecond suffix; correlated to the order by the display code.
pub(crate) fn payment_reference(order_number: &str, millis: i64) -> String {
    format!("FS_{order_number}_{millis}")
}
