//! Order creation, guest-user upsert and listing behaviour against a real
//! (in-memory) database.

mod common;

use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

use farmstand_api::entities::order::{Entity as OrderEntity, OrderStatus};
use farmstand_api::entities::order_item::Entity as OrderItemEntity;
use farmstand_api::entities::user::{self, Entity as UserEntity};
use farmstand_api::errors::ServiceError;
use farmstand_api::services::orders::{CreateOrderItemRequest, OrderFilter, OrderService};

use common::{checkout_request, seed_product, setup_db};

#[tokio::test]
async fn checkout_creates_guest_user_once() {
    let db = setup_db().await;
    let product_id = seed_product(&db, 10).await;
    let orders = OrderService::new(db.clone(), None);

    let first = orders
        .create_order(checkout_request(product_id, "ada@example.com"))
        .await
        .unwrap();
    let second = orders
        .create_order(checkout_request(product_id, "ada@example.com"))
        .await
        .unwrap();

    // Same customer email resolves to the same user record.
    assert_eq!(first.user_id, second.user_id);

    let users = UserEntity::find()
        .filter(user::Column::Email.eq("ada@example.com"))
        .all(&*db)
        .await
        .unwrap();
    assert_eq!(users.len(), 1);
    assert!(users[0].is_guest);
    assert!(users[0].password_hash.is_none());
    assert_eq!(users[0].role, "customer");
}

#[tokio::test]
async fn order_numbers_are_unique_across_orders() {
    let db = setup_db().await;
    let product_id = seed_product(&db, 10).await;
    let orders = OrderService::new(db.clone(), None);

    let a = orders
        .create_order(checkout_request(product_id, "ada@example.com"))
        .await
        .unwrap();
    let b = orders
        .create_order(checkout_request(product_id, "ada@example.com"))
        .await
        .unwrap();

    assert_ne!(a.order_number, b.order_number);
    assert!(a.order_number.starts_with("FS-"));
}

#[tokio::test]
async fn invalid_request_leaves_no_rows_behind() {
    let db = setup_db().await;
    let product_id = seed_product(&db, 10).await;
    let orders = OrderService::new(db.clone(), None);

    let mut request = checkout_request(product_id, "ada@example.com");
    request.items.clear();
    let err = orders.create_order(request).await.unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));

    assert_eq!(OrderEntity::find().count(&*db).await.unwrap(), 0);
    assert_eq!(UserEntity::find().count(&*db).await.unwrap(), 0);
}

#[tokio::test]
async fn failed_item_insert_rolls_back_entire_order() {
    let db = setup_db().await;
    let product_id = seed_product(&db, 10).await;
    let orders = OrderService::new(db.clone(), None);

    // Second line references a product that does not exist, so its insert
    // trips the foreign key after the order row and the first item are in.
    let mut request = checkout_request(product_id, "ada@example.com");
    request.items.push(CreateOrderItemRequest {
        product_id: uuid::Uuid::new_v4(),
        quantity: 1,
        price: dec!(1000.00),
    });

    let err = orders.create_order(request).await.unwrap_err();
    assert!(matches!(err, ServiceError::DatabaseError(_)));

    // Nothing from the transaction is visible, not even the valid first item.
    assert_eq!(OrderEntity::find().count(&*db).await.unwrap(), 0);
    assert_eq!(OrderItemEntity::find().count(&*db).await.unwrap(), 0);
    assert_eq!(UserEntity::find().count(&*db).await.unwrap(), 0);
}

#[tokio::test]
async fn get_order_returns_items() {
    let db = setup_db().await;
    let product_id = seed_product(&db, 10).await;
    let orders = OrderService::new(db.clone(), None);

    let created = orders
        .create_order(checkout_request(product_id, "ada@example.com"))
        .await
        .unwrap();
    let fetched = orders.get_order(created.id).await.unwrap();

    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.items.len(), 1);
    assert_eq!(fetched.items[0].product_id, product_id);
    assert_eq!(fetched.items[0].quantity, 2);
    assert_eq!(fetched.items[0].price, 500_000);
}

#[tokio::test]
async fn get_unknown_order_is_not_found() {
    let db = setup_db().await;
    let orders = OrderService::new(db.clone(), None);
    let err = orders.get_order(uuid::Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn list_orders_filters_by_email_and_status() {
    let db = setup_db().await;
    let product_id = seed_product(&db, 10).await;
    let orders = OrderService::new(db.clone(), None);

    orders
        .create_order(checkout_request(product_id, "ada@example.com"))
        .await
        .unwrap();
    orders
        .create_order(checkout_request(product_id, "obi@example.com"))
        .await
        .unwrap();

    let by_email = orders
        .list_orders(
            OrderFilter {
                email: Some("ada@example.com".into()),
                status: None,
            },
            1,
            20,
        )
        .await
        .unwrap();
    assert_eq!(by_email.total, 1);
    assert_eq!(by_email.orders[0].email, "ada@example.com");

    // Nothing is confirmed yet.
    let confirmed = orders
        .list_orders(
            OrderFilter {
                email: None,
                status: Some(OrderStatus::Confirmed),
            },
            1,
            20,
        )
        .await
        .unwrap();
    assert_eq!(confirmed.total, 0);

    let all = orders
        .list_orders(OrderFilter::default(), 1, 20)
        .await
        .unwrap();
    assert_eq!(all.total, 2);
    assert_eq!(all.total_pages, 1);
}
