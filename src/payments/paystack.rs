use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, instrument, warn};

use crate::errors::ServiceError;
use crate::payments::gateway::{
    InitializeData, InitializeRequest, PaymentGateway, VerifyData,
};

pub const DEFAULT_BASE_URL: &str = "https://api.paystack.co";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Envelope wrapping every Paystack response body.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: bool,
    message: String,
    data: Option<T>,
}

#[derive(Debug, Serialize, Deserialize)]
struct VerifyPayload {
    status: String,
    reference: String,
    amount: i64,
    gateway_response: Option<String>,
    paid_at: Option<String>,
    channel: Option<String>,
    currency: Option<String>,
}

/// Paystack HTTP client.
///
/// Constructed once at startup with an explicit secret key and injected into
/// the settlement workflow. There is no fallback behavior when the key is
/// missing: construction fails instead of fabricating payment data.
#[derive(Clone)]
pub struct PaystackClient {
    client: reqwest::Client,
    secret_key: String,
    base_url: String,
}

impl PaystackClient {
    pub fn new(secret_key: String, base_url: impl Into<String>) -> Result<Self, ServiceError> {
        if secret_key.trim().is_empty() {
            return Err(ServiceError::InvalidInput(
                "Paystack secret key must not be empty".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ServiceError::InternalError(format!("HTTP client build failed: {e}")))?;
        Ok(Self {
            client,
            secret_key,
            base_url: base_url.into(),
        })
    }

    async fn parse_envelope<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ServiceError> {
        let status = response.status();
        let body = response.text().await.map_err(|e| {
            ServiceError::PaymentGatewayUnavailable(format!("reading response body: {e}"))
        })?;

        let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|e| {
            warn!(%status, "gateway returned non-JSON or unexpected body");
            ServiceError::PaymentGatewayError(format!("invalid gateway response: {e}"))
        })?;

        if !status.is_success() || !envelope.status {
            error!(%status, message = %envelope.message, "gateway rejected request");
            return Err(ServiceError::PaymentGatewayError(envelope.message));
        }

        envelope.data.ok_or_else(|| {
            ServiceError::PaymentGatewayError("gateway response missing data".to_string())
        })
    }
}

#[async_trait]
impl PaymentGateway for PaystackClient {
    #[instrument(skip(self, request), fields(reference = %request.reference, amount = request.amount))]
    async fn initialize(
        &self,
        request: InitializeRequest,
    ) -> Result<InitializeData, ServiceError> {
        let body = json!({
            "email": request.email,
            "amount": request.amount,
            "reference": request.reference,
            "callback_url": request.callback_url,
            "metadata": {
                "custom_fields": [
                    {
                        "display_name": "Order Number",
                        "variable_name": "order_number",
                        "value": request.metadata.order_number,
                    },
                    {
                        "display_name": "Customer Name",
                        "variable_name": "customer_name",
                        "value": request.metadata.customer_name,
                    }
                ]
            },
        });

        let response = self
            .client
            .post(format!("{}/transaction/initialize", self.base_url))
            .bearer_auth(&self.secret_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::PaymentGatewayUnavailable(e.to_string()))?;

        Self::parse_envelope::<InitializeData>(response).await
    }

    #[instrument(skip(self))]
    async fn verify(&self, reference: &str) -> Result<VerifyData, ServiceError> {
        let response = self
            .client
            .get(format!("{}/transaction/verify/{reference}", self.base_url))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| ServiceError::PaymentGatewayUnavailable(e.to_string()))?;

        let payload = Self::parse_envelope::<VerifyPayload>(response).await?;
        Ok(VerifyData {
            status: payload.status,
            reference: payload.reference,
            amount: payload.amount,
            gateway_response: payload.gateway_response,
            paid_at: payload.paid_at,
            channel: payload.channel,
            currency: payload.currency,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_secret_key() {
        assert!(PaystackClient::new(String::new(), DEFAULT_BASE_URL).is_err());
        assert!(PaystackClient::new("   ".to_string(), DEFAULT_BASE_URL).is_err());
    }

    #[test]
    fn accepts_non_empty_secret_key() {
        assert!(PaystackClient::new("sk_test_abc".to_string(), DEFAULT_BASE_URL).is_ok());
    }
}
