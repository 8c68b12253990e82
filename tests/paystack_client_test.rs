//! Paystack HTTP client behaviour against a mock gateway server.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use farmstand_api::errors::ServiceError;
use farmstand_api::payments::{
    InitializeRequest, PaymentGateway, PaystackClient, TransactionMetadata,
};

fn init_request(reference: &str) -> InitializeRequest {
    InitializeRequest {
        email: "ada@example.com".into(),
        amount: 1_000_000,
        reference: reference.into(),
        callback_url: Some("https://shop.example.com/payment/callback".into()),
        metadata: TransactionMetadata {
            order_number: "FS-20250901-ABCD1234".into(),
            customer_name: "Ada Obi".into(),
        },
    }
}

#[tokio::test]
async fn initialize_sends_bearer_auth_and_parses_envelope() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/transaction/initialize"))
        .and(header("authorization", "Bearer sk_test_abc"))
        .and(body_partial_json(json!({
            "email": "ada@example.com",
            "amount": 1_000_000,
            "reference": "FS_FS-20250901-ABCD1234_1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "message": "Authorization URL created",
            "data": {
                "authorization_url": "https://checkout.paystack.com/abc123",
                "access_code": "abc123",
                "reference": "FS_FS-20250901-ABCD1234_1"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = PaystackClient::new("sk_test_abc".into(), server.uri()).unwrap();
    let data = client
        .initialize(init_request("FS_FS-20250901-ABCD1234_1"))
        .await
        .unwrap();

    assert_eq!(
        data.authorization_url,
        "https://checkout.paystack.com/abc123"
    );
    assert_eq!(data.reference, "FS_FS-20250901-ABCD1234_1");
}

#[tokio::test]
async fn initialize_error_envelope_is_gateway_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/transaction/initialize"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "status": false,
            "message": "Invalid key"
        })))
        .mount(&server)
        .await;

    let client = PaystackClient::new("sk_test_bad".into(), server.uri()).unwrap();
    let err = client
        .initialize(init_request("FS_FS-20250901-ABCD1234_2"))
        .await
        .unwrap_err();

    match err {
        ServiceError::PaymentGatewayError(message) => assert_eq!(message, "Invalid key"),
        other => panic!("expected gateway error, got {other:?}"),
    }
}

#[tokio::test]
async fn verify_parses_transaction_payload() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/transaction/verify/FS_FS-20250901-ABCD1234_3"))
        .and(header("authorization", "Bearer sk_test_abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "message": "Verification successful",
            "data": {
                "status": "success",
                "reference": "FS_FS-20250901-ABCD1234_3",
                "amount": 1_000_000,
                "gateway_response": "Approved",
                "paid_at": "2025-09-01T10:30:00.000Z",
                "channel": "card",
                "currency": "NGN"
            }
        })))
        .mount(&server)
        .await;

    let client = PaystackClient::new("sk_test_abc".into(), server.uri()).unwrap();
    let data = client.verify("FS_FS-20250901-ABCD1234_3").await.unwrap();

    assert!(data.is_success());
    assert_eq!(data.amount, 1_000_000);
    assert_eq!(data.channel.as_deref(), Some("card"));
}

#[tokio::test]
async fn verify_declined_transaction_is_not_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/transaction/verify/FS_FS-20250901-ABCD1234_4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "message": "Verification successful",
            "data": {
                "status": "failed",
                "reference": "FS_FS-20250901-ABCD1234_4",
                "amount": 1_000_000,
                "gateway_response": "Declined",
                "paid_at": null,
                "channel": "card",
                "currency": "NGN"
            }
        })))
        .mount(&server)
        .await;

    let client = PaystackClient::new("sk_test_abc".into(), server.uri()).unwrap();
    let data = client.verify("FS_FS-20250901-ABCD1234_4").await.unwrap();

    assert!(!data.is_success());
    assert_eq!(data.gateway_response.as_deref(), Some("Declined"));
}

#[tokio::test]
async fn non_json_body_is_gateway_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/transaction/verify/FS_FS-20250901-ABCD1234_5"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&server)
        .await;

    let client = PaystackClient::new("sk_test_abc".into(), server.uri()).unwrap();
    let err = client
        .verify("FS_FS-20250901-ABCD1234_5")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::PaymentGatewayError(_)));
}
