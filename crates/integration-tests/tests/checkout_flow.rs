//! Reserve, coupon and order submission against the mock backend.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use annya_integration_tests::{TestBackend, product, token};
use annya_storefront::CheckoutError;
use annya_storefront::api::{ApiClient, StorefrontApi};
use annya_storefront::checkout::{CheckoutSession, CheckoutState, FormField};
use annya_storefront::config::CheckoutConfig;
use annya_storefront::storage::{KeyValueStore, MemoryStore};
use rust_decimal::Decimal;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

fn fill_form<S: KeyValueStore, A: StorefrontApi>(session: &mut CheckoutSession<'_, S, A>) {
    for (field, value) in [
        (FormField::Email, "priya@example.in"),
        (FormField::Phone, "9876543210"),
        (FormField::FirstName, "Priya"),
        (FormField::LastName, "Sharma"),
        (FormField::Address, "12 Banjara Hills"),
        (FormField::City, "Hyderabad"),
        (FormField::PostalCode, "500034"),
    ] {
        session.set_field(field, value);
    }
}

async fn mount_ok(backend: &TestBackend, endpoint: &str, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(endpoint))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&backend.server)
        .await;
}

fn receipt() -> serde_json::Value {
    json!({"success": true, "orderId": "o-1", "orderNumber": "ANN-1001"})
}

fn storefront(backend: &TestBackend) -> annya_storefront::Storefront<MemoryStore, ApiClient> {
    let mut store = backend.storefront(CheckoutConfig::default());
    store
        .cart_mut()
        .add_to_cart(product("anklet-1", "Silver Anklet", 1200), 2);
    store
        .cart_mut()
        .add_to_cart(product("bangle-1", "Gold Bangle", 3000), 1);
    store
}

#[tokio::test]
async fn test_full_checkout() {
    let backend = TestBackend::start().await;
    mount_ok(&backend, "/api/cart/reserve", json!({"success": true})).await;
    mount_ok(
        &backend,
        "/api/coupons/verify",
        json!({"code": "FEST", "discountAmount": 500.0}),
    )
    .await;
    mount_ok(&backend, "/api/orders", receipt()).await;
    mount_ok(&backend, "/api/cart/convert", json!({"success": true})).await;
    mount_ok(&backend, "/api/cart/save", json!({"success": true})).await;

    let mut store = storefront(&backend);
    store.apply_coupon("FEST").await.unwrap();

    let mut session = store.proceed_to_checkout().await.unwrap();
    assert!(session.time_left().is_some());
    fill_form(&mut session);

    let summary = session.summary();
    assert_eq!(summary.subtotal, Decimal::from(5400));
    assert_eq!(summary.discount, Decimal::from(500));
    assert_eq!(summary.shipping, Decimal::from(100));
    assert_eq!(summary.total, Decimal::from(5000));

    let receipt = session.submit_order(Some(&token())).await.unwrap();
    assert_eq!(receipt.order_number, "ANN-1001");
    assert!(matches!(session.state(), CheckoutState::OrderPlaced(_)));
    assert!(session.idempotency_key().is_none());
    drop(session);

    assert!(store.cart().is_empty());
    assert!(store.cart().coupon().is_none());

    let reserves = backend.bodies("/api/cart/reserve").await;
    assert_eq!(reserves.len(), 2);
    assert_eq!(reserves[0]["product_id"], "anklet-1");
    assert_eq!(reserves[1]["product_id"], "bangle-1");

    let coupon = &backend.bodies("/api/coupons/verify").await[0];
    assert_eq!(coupon["orderTotal"], json!(5400.0));

    let order = &backend.bodies("/api/orders").await[0];
    assert_eq!(order["couponCode"], "FEST");
    assert_eq!(order["paymentMethod"], "cod");
    assert_eq!(order["items"][0], json!({"productId": "anklet-1", "quantity": 2}));
    assert_eq!(order["shippingAddress"]["state"], "Telangana");
    assert_eq!(order["sessionId"], reserves[0]["session_id"]);

    let converts = backend.bodies("/api/cart/convert").await;
    assert_eq!(converts, vec![json!({"email": "priya@example.in"})]);
}

#[tokio::test]
async fn test_reservation_stops_at_first_refusal() {
    let backend = TestBackend::start().await;
    Mock::given(method("POST"))
        .and(path("/api/cart/reserve"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({"detail": "Only 1 left in stock"})),
        )
        .mount(&backend.server)
        .await;

    let mut store = storefront(&backend);
    store
        .cart_mut()
        .add_to_cart(product("ring-1", "Solitaire Ring", 900), 1);

    let err = store.proceed_to_checkout().await.err().unwrap();
    assert_eq!(
        err.user_message(),
        "Could not reserve Silver Anklet: Only 1 left in stock"
    );
    assert_eq!(backend.bodies("/api/cart/reserve").await.len(), 1);
    assert_eq!(store.cart().items().len(), 3);
}

#[tokio::test]
async fn test_retry_after_server_error_reuses_key() {
    let backend = TestBackend::start().await;
    mount_ok(&backend, "/api/cart/convert", json!({"success": true})).await;
    mount_ok(&backend, "/api/cart/save", json!({"success": true})).await;
    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&backend.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(receipt()))
        .with_priority(2)
        .mount(&backend.server)
        .await;

    let mut store = storefront(&backend);
    let mut session = store.checkout(None).unwrap();
    fill_form(&mut session);

    let err = session.submit_order(Some(&token())).await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(err.user_message(), "Failed to place order. Please try again.");
    assert_eq!(session.state(), &CheckoutState::Editing);
    assert_eq!(session.cart().items().len(), 2);

    session.submit_order(Some(&token())).await.unwrap();

    let orders = backend.bodies("/api/orders").await;
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["idempotencyKey"], orders[1]["idempotencyKey"]);

    let err = session.submit_order(Some(&token())).await.unwrap_err();
    assert!(matches!(err, CheckoutError::AlreadyPlaced));
}

#[tokio::test]
async fn test_rejected_order_keeps_cart_and_shows_detail() {
    let backend = TestBackend::start().await;
    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"detail": "Cash on delivery unavailable for this PIN code"})),
        )
        .mount(&backend.server)
        .await;

    let mut store = storefront(&backend);
    let mut session = store.checkout(None).unwrap();
    fill_form(&mut session);

    let err = session.submit_order(Some(&token())).await.unwrap_err();
    assert!(!err.is_retryable());
    assert_eq!(
        err.user_message(),
        "Cash on delivery unavailable for this PIN code"
    );
    drop(session);
    assert_eq!(store.cart().items().len(), 2);
}

#[tokio::test]
async fn test_created_response_without_success_flag_places_order() {
    let backend = TestBackend::start().await;
    mount_ok(&backend, "/api/cart/convert", json!({"success": true})).await;
    mount_ok(&backend, "/api/cart/save", json!({"success": true})).await;
    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"orderId": "o-9", "orderNumber": "ANN-9"})),
        )
        .mount(&backend.server)
        .await;

    let mut store = storefront(&backend);
    let mut session = store.checkout(None).unwrap();
    fill_form(&mut session);

    let receipt = session.submit_order(Some(&token())).await.unwrap();
    assert_eq!(receipt.order_number, "ANN-9");
    assert!(matches!(session.state(), CheckoutState::OrderPlaced(_)));
    drop(session);
    assert!(store.cart().is_empty());
}

#[tokio::test]
async fn test_explicit_success_false_is_rejected() {
    let backend = TestBackend::start().await;
    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"success": false, "orderId": "o-9", "orderNumber": "ANN-9"}),
        ))
        .mount(&backend.server)
        .await;

    let mut store = storefront(&backend);
    let mut session = store.checkout(None).unwrap();
    fill_form(&mut session);

    let err = session.submit_order(Some(&token())).await.unwrap_err();
    assert!(matches!(err, CheckoutError::OrderRejected(_)));
    drop(session);
    assert_eq!(store.cart().items().len(), 2);
}

#[tokio::test]
async fn test_missing_or_refused_credential() {
    let backend = TestBackend::start().await;
    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Not authenticated"})))
        .mount(&backend.server)
        .await;

    let mut store = storefront(&backend);
    let mut session = store.checkout(None).unwrap();
    fill_form(&mut session);

    let err = session.submit_order(None).await.unwrap_err();
    assert!(matches!(err, CheckoutError::AuthenticationRequired));
    assert!(backend.bodies("/api/orders").await.is_empty());

    let err = session.submit_order(Some(&token())).await.unwrap_err();
    assert!(matches!(err, CheckoutError::AuthenticationRequired));
    assert_eq!(err.user_message(), "Please login to place an order");
}

#[tokio::test]
async fn test_email_edit_sends_abandoned_cart_snapshot() {
    let backend = TestBackend::start().await;
    mount_ok(&backend, "/api/cart/save", json!({"success": true})).await;

    let mut store = backend.storefront(CheckoutConfig {
        cart_save_debounce: Duration::from_millis(50),
        ..CheckoutConfig::default()
    });
    store
        .cart_mut()
        .add_to_cart(product("anklet-1", "Silver Anklet", 1200), 1);

    let mut session = store.checkout(None).unwrap();
    session.set_field(FormField::FirstName, "Priya");
    session.set_field(FormField::Email, "priya@");
    session.set_field(FormField::Email, "priya@example.in");
    assert!(session.has_pending_cart_save());

    tokio::time::sleep(Duration::from_millis(400)).await;

    let saves = backend.bodies("/api/cart/save").await;
    assert_eq!(saves.len(), 1);
    assert_eq!(saves[0]["email"], "priya@example.in");
    assert_eq!(saves[0]["customer_name"], "Priya");
    assert_eq!(saves[0]["phone"], json!(null));
    assert_eq!(saves[0]["cart_total"], json!(1200.0));
    assert_eq!(saves[0]["items"][0]["quantity"], 1);
}
