use axum::{extract::State, routing::post, Json, Router};

use crate::errors::ServiceError;
use crate::payments::InitializeData;
use crate::services::settlement::{
    InitializePaymentRequest, VerifyPaymentRequest, VerifyPaymentResponse,
};
use crate::{ApiResponse, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/payments/initialize", post(initialize_payment))
        .route("/payments/verify", post(verify_payment))
}

/// Initialize a gateway transaction for an order
#[utoipa::path(
    post,
    path = "/api/v1/payments/initialize",
    request_body = InitializePaymentRequest,
    responses(
        (status = 200, description = "Hosted checkout redirect", body = ApiResponse<InitializeData>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Order already paid", body = crate::errors::ErrorResponse),
        (status = 502, description = "Gateway rejected or unreachable", body = crate::errors::ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn initialize_payment(
    State(state): State<AppState>,
    Json(request): Json<InitializePaymentRequest>,
) -> Result<Json<ApiResponse<InitializeData>>, ServiceError> {
    let data = state.services.settlement.initialize_payment(request).await?;
    Ok(Json(ApiResponse::success(data)))
}

/// Verify a payment by gateway reference and settle the order
#[utoipa::path(
    post,
    path = "/api/v1/payments/verify",
    request_body = VerifyPaymentRequest,
    responses(
        (status = 200, description = "Payment verified, order settled", body = ApiResponse<VerifyPaymentResponse>),
        (status = 400, description = "Amount mismatch", body = crate::errors::ErrorResponse),
        (status = 402, description = "Gateway reported failure", body = crate::errors::ErrorResponse),
        (status = 404, description = "No order for reference", body = crate::errors::ErrorResponse),
        (status = 502, description = "Gateway unreachable", body = crate::errors::ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn verify_payment(
    State(state): State<AppState>,
    Json(request): Json<VerifyPaymentRequest>,
) -> Result<Json<ApiResponse<VerifyPaymentResponse>>, ServiceError> {
    let data = state.services.settlement.verify_payment(request).await?;
    Ok(Json(ApiResponse::success(data)))
}
