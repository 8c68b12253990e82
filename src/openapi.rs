//! OpenAPI documentation assembly.

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Farmstand API",
        description = "Storefront API: catalog, orders, and Paystack settlement",
        version = env!("CARGO_PKG_VERSION"),
    ),
    paths(
        crate::handlers::orders::create_order,
        crate::handlers::orders::get_order,
        crate::handlers::orders::list_orders,
        crate::handlers::payments::initialize_payment,
        crate::handlers::payments::verify_payment,
        crate::handlers::products::list_products,
        crate::handlers::products::create_product,
        crate::handlers::products::get_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,
        crate::handlers::categories::list_categories,
        crate::handlers::categories::create_category,
        crate::handlers::categories::update_category,
        crate::handlers::categories::delete_category,
    ),
    tags(
        (name = "Orders", description = "Order placement and lookup"),
        (name = "Payments", description = "Payment initialization and settlement"),
        (name = "Products", description = "Catalog management"),
        (name = "Categories", description = "Category management"),
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}

/// Router wrapper so `main` can merge the UI with typed state.
pub fn swagger_routes() -> axum::Router<AppState> {
    axum::Router::new().merge(swagger_ui())
}
