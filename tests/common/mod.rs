//! Shared test fixtures: an in-memory SQLite database with migrations applied
//! and a programmable fake payment gateway.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use migrations::Migrator;
use rust_decimal_macros::dec;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use farmstand_api::errors::ServiceError;
use farmstand_api::payments::{
    InitializeData, InitializeRequest, PaymentGateway, VerifyData,
};
use farmstand_api::services::categories::{CategoryService, CreateCategoryRequest};
use farmstand_api::services::orders::{CreateOrderItemRequest, CreateOrderRequest};
use farmstand_api::services::products::{CreateProductRequest, ProductService};

pub async fn setup_db() -> Arc<DatabaseConnection> {
    // A single pooled connection keeps every query on the same in-memory
    // database.
    let mut options = ConnectOptions::new("sqlite::memory:".to_owned());
    options.max_connections(1);
    let db = Database::connect(options)
        .await
        .expect("sqlite in-memory connection");
    Migrator::up(&db, None).await.expect("migrations apply");
    Arc::new(db)
}

/// Outcome the fake gateway reports for the next verify call.
#[derive(Debug, Clone)]
pub struct VerifyOutcome {
    pub status: String,
    pub amount: i64,
}

/// Test double for the payment gateway, explicitly injected by each test.
/// Records initialize calls and replays a configured verify outcome.
pub struct FakeGateway {
    pub initialized: Mutex<Vec<InitializeRequest>>,
    outcome: Mutex<VerifyOutcome>,
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            initialized: Mutex::new(Vec::new()),
            outcome: Mutex::new(VerifyOutcome {
                status: "success".to_string(),
                amount: 0,
            }),
        })
    }

    pub fn set_outcome(&self, status: &str, amount: i64) {
        *self.outcome.lock().unwrap() = VerifyOutcome {
            status: status.to_string(),
            amount,
        };
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn initialize(
        &self,
        request: InitializeRequest,
    ) -> Result<InitializeData, ServiceError> {
        let reference = request.reference.clone();
        self.initialized.lock().unwrap().push(request);
        Ok(InitializeData {
            authorization_url: format!("https://checkout.test/{reference}"),
            access_code: format!("ACC_{reference}"),
            reference,
        })
    }

    async fn verify(&self, reference: &str) -> Result<VerifyData, ServiceError> {
        let outcome = self.outcome.lock().unwrap().clone();
        Ok(VerifyData {
            status: outcome.status,
            reference: reference.to_string(),
            amount: outcome.amount,
            gateway_response: Some("Approved".to_string()),
            paid_at: Some("2025-09-01T10:30:00.000Z".to_string()),
            channel: Some("card".to_string()),
            currency: Some("NGN".to_string()),
        })
    }
}

/// Seeds a category and one product, returning the product id.
pub async fn seed_product(db: &Arc<DatabaseConnection>, stock_count: i32) -> Uuid {
    let categories = CategoryService::new(db.clone());
    let category = categories
        .create_category(CreateCategoryRequest {
            name: format!("Proteins-{}", Uuid::new_v4().simple()),
            icon: None,
            description: None,
        })
        .await
        .expect("category created");

    let products = ProductService::new(db.clone());
    let product = products
        .create_product(CreateProductRequest {
            name: "Goat Meat 1kg".to_string(),
            description: Some("Fresh cuts".to_string()),
            price: dec!(5000.00),
            original_price: None,
            category_id: category.id,
            images: vec![],
            tags: vec!["meat".to_string()],
            featured: false,
            best_seller: false,
            organic: false,
            badge: None,
            stock_count,
        })
        .await
        .expect("product created");
    product.id
}

/// Checkout request for two units of the given product at 5,000.00 naira each.
pub fn checkout_request(product_id: Uuid, email: &str) -> CreateOrderRequest {
    CreateOrderRequest {
        items: vec![CreateOrderItemRequest {
            product_id,
            quantity: 2,
            price: dec!(5000.00),
        }],
        total_amount: dec!(10000),
        delivery_fee: Some(dec!(0)),
        delivery_address: "12 Marina Rd".to_string(),
        delivery_city: "Lagos".to_string(),
        delivery_state: "Lagos".to_string(),
        phone: "+2348012345678".to_string(),
        email: email.to_string(),
        first_name: "Ada".to_string(),
        last_name: "Obi".to_string(),
        payment_method: Some("card".to_string()),
    }
}
