pub mod categories;
pub mod orders;
pub mod payments;
pub mod products;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::events::EventSender;
use crate::payments::PaymentGateway;
use crate::services::categories::CategoryService;
use crate::services::orders::OrderService;
use crate::services::products::ProductService;
use crate::services::settlement::SettlementService;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<OrderService>,
    pub settlement: Arc<SettlementService>,
    pub products: Arc<ProductService>,
    pub categories: Arc<CategoryService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DatabaseConnection>,
        gateway: Arc<dyn PaymentGateway>,
        event_sender: EventSender,
        config: &AppConfig,
    ) -> Self {
        let event_sender = Arc::new(event_sender);
        Self {
            orders: Arc::new(OrderService::new(db.clone(), Some(event_sender.clone()))),
            settlement: Arc::new(SettlementService::new(
                db.clone(),
                gateway,
                Some(event_sender),
                config.paystack.callback_url.clone(),
            )),
            products: Arc::new(ProductService::new(db.clone())),
            categories: Arc::new(CategoryService::new(db)),
        }
    }
}
