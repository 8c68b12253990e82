//! Payment gateway boundary.
//!
//! The storefront consumes exactly two remote operations: initialize a
//! transaction and verify one. Amounts at this boundary are always integer
//! minor units (kobo). The trait exists so the settlement workflow takes an
//! injected gateway instance and tests can substitute a fake without touching
//! process-wide state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::ServiceError;

/// Traceability fields forwarded to the gateway dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionMetadata {
    pub order_number: String,
    pub customer_name: String,
}

/// Input for initializing a hosted-checkout transaction.
#[derive(Debug, Clone, Serialize)]
pub struct InitializeRequest {
    pub email: String,
    /// Amount in kobo.
    pub amount: i64,
    pub reference: String,
    pub callback_url: Option<String>,
    pub metadata: TransactionMetadata,
}

/// Gateway response to a successful initialization: where to send the
/// customer's browser.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InitializeData {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

/// Authoritative transaction state as reported by the gateway's verify call.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VerifyData {
    /// Gateway-side transaction status, e.g. "success", "failed", "abandoned".
    pub status: String,
    pub reference: String,
    /// Paid amount in kobo. The single source of truth for reconciliation.
    pub amount: i64,
    pub gateway_response: Option<String>,
    pub paid_at: Option<String>,
    pub channel: Option<String>,
    pub currency: Option<String>,
}

impl VerifyData {
    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case("success")
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Initializes a transaction and returns the hosted-checkout redirect.
    async fn initialize(&self, request: InitializeRequest)
        -> Result<InitializeData, ServiceError>;

    /// Verifies a transaction by reference. Transport failures surface as
    /// errors; a completed-but-unsuccessful payment is a normal `VerifyData`
    /// with a non-success status.
    async fn verify(&self, reference: &str) -> Result<VerifyData, ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_status_is_case_insensitive() {
        let data = VerifyData {
            status: "Success".into(),
            reference: "FS_X_1".into(),
            amount: 1000,
            gateway_response: None,
            paid_at: None,
            channel: None,
            currency: None,
        };
        assert!(data.is_success());
    }

    #[test]
    fn non_success_statuses_are_not_success() {
        for status in ["failed", "abandoned", "ongoing", ""] {
            let data = VerifyData {
                status: status.into(),
                reference: "FS_X_1".into(),
                amount: 1000,
                gateway_response: None,
                paid_at: None,
                channel: None,
                currency: None,
            };
            assert!(!data.is_success(), "{status} must not count as success");
        }
    }
}
