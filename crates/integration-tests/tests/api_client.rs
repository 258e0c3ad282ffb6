//! Wire contract of the HTTP client.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use annya_core::{IdempotencyKey, ProductId, SessionId};
use annya_integration_tests::{TEST_TOKEN, TestBackend, token};
use annya_storefront::api::{
    ApiClient, ApiError, ConvertRequest, CouponRequest, OrderLine, OrderRequest, PaymentMethod,
    ReservationRequest, ShippingAddress, StorefrontApi,
};
use annya_storefront::config::ApiConfig;
use rust_decimal::Decimal;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

fn order() -> OrderRequest {
    OrderRequest {
        items: vec![OrderLine {
            product_id: ProductId::new("ring-1"),
            quantity: 2,
        }],
        shipping_address: ShippingAddress {
            first_name: "Priya".to_string(),
            last_name: "Sharma".to_string(),
            address: "12 Banjara Hills".to_string(),
            city: "Hyderabad".to_string(),
            state: "Telangana".to_string(),
            pincode: "500034".to_string(),
            country: "India".to_string(),
            phone: "9876543210".to_string(),
        },
        payment_method: PaymentMethod::CashOnDelivery,
        coupon_code: None,
        session_id: SessionId::new("s-1"),
        idempotency_key: IdempotencyKey::new("k-1"),
    }
}

#[tokio::test]
async fn test_reserve_posts_snake_case_body() {
    let backend = TestBackend::start().await;
    Mock::given(method("POST"))
        .and(path("/api/cart/reserve"))
        .and(body_json(json!({"product_id": "ring-1", "session_id": "s-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&backend.server)
        .await;

    backend
        .client()
        .reserve(&ReservationRequest {
            product_id: ProductId::new("ring-1"),
            session_id: SessionId::new("s-1"),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_verify_coupon_parses_camel_case_coupon() {
    let backend = TestBackend::start().await;
    Mock::given(method("POST"))
        .and(path("/api/coupons/verify"))
        .and(body_json(json!({"code": "FEST", "orderTotal": 2500.0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": "FEST",
            "discountAmount": 250.0,
            "description": "10% off",
            "type": "percent",
            "value": 10
        })))
        .mount(&backend.server)
        .await;

    let coupon = backend
        .client()
        .verify_coupon(&CouponRequest {
            code: "FEST".to_string(),
            order_total: Decimal::from(2500),
        })
        .await
        .unwrap();

    assert_eq!(coupon.discount_amount, Decimal::from(250));
    assert_eq!(coupon.kind.as_deref(), Some("percent"));
}

#[tokio::test]
async fn test_create_order_sends_bearer_and_body() {
    let backend = TestBackend::start().await;
    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .and(header("authorization", format!("Bearer {TEST_TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "orderId": "o-7",
            "orderNumber": "ANN-1007"
        })))
        .mount(&backend.server)
        .await;

    let receipt = backend
        .client()
        .create_order(&order(), &token())
        .await
        .unwrap();
    assert_eq!(receipt.order_number, "ANN-1007");

    let sent = backend.bodies("/api/orders").await;
    assert_eq!(sent[0]["paymentMethod"], "cod");
    assert_eq!(sent[0]["idempotencyKey"], "k-1");
    assert_eq!(sent[0]["items"][0]["productId"], "ring-1");
    assert_eq!(sent[0]["shippingAddress"]["pincode"], "500034");
    assert!(sent[0].get("couponCode").is_none());
}

#[tokio::test]
async fn test_unauthorized_maps_to_its_own_variant() {
    let backend = TestBackend::start().await;
    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"})),
        )
        .mount(&backend.server)
        .await;

    let err = backend
        .client()
        .create_order(&order(), &token())
        .await
        .unwrap_err();

    assert!(matches!(&err, ApiError::Unauthorized(m) if m == "Token expired"));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_error_detail_string_and_list() {
    let backend = TestBackend::start().await;
    Mock::given(method("POST"))
        .and(path("/api/coupons/verify"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"detail": "Coupon has expired"})),
        )
        .mount(&backend.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/cart/convert"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "detail": [{"loc": ["body", "email"], "msg": "field required"}]
        })))
        .mount(&backend.server)
        .await;

    let client = backend.client();
    let err = client
        .verify_coupon(&CouponRequest {
            code: "OLD".to_string(),
            order_total: Decimal::from(100),
        })
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(err.detail(), Some("Coupon has expired"));
    assert!(!err.is_transient());

    let err = client
        .convert_cart(&ConvertRequest {
            email: "a@b.in".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(422));
    assert!(err.detail().unwrap().contains("field required"));
}

#[tokio::test]
async fn test_server_error_is_transient_with_plain_body() {
    let backend = TestBackend::start().await;
    Mock::given(method("POST"))
        .and(path("/api/cart/reserve"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&backend.server)
        .await;

    let err = backend
        .client()
        .reserve(&ReservationRequest {
            product_id: ProductId::new("ring-1"),
            session_id: SessionId::new("s-1"),
        })
        .await
        .unwrap_err();

    assert!(err.is_transient());
    assert_eq!(err.detail(), Some("Bad Gateway"));
}

#[tokio::test]
async fn test_malformed_success_body_is_a_parse_error() {
    let backend = TestBackend::start().await;
    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&backend.server)
        .await;

    let err = backend
        .client()
        .create_order(&order(), &token())
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Parse(_)));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_unreachable_backend_is_transient() {
    let config = ApiConfig {
        request_timeout: Duration::from_secs(1),
        ..ApiConfig::new(Url::parse("http://127.0.0.1:1/api").unwrap())
    };
    let client = ApiClient::new(&config).unwrap();

    let err = client
        .reserve(&ReservationRequest {
            product_id: ProductId::new("ring-1"),
            session_id: SessionId::new("s-1"),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Http(_)));
    assert!(err.is_transient());
}
