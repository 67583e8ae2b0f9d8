//! Catalog browsing and checkout against a mock backend.

#![allow(clippy::unwrap_used)]

use std::num::NonZeroU32;

use serde_json::json;
use storefront_sync::StoreError;
use storefront_sync_core::{OrderStatus, ProductFilter, ProductId, Size};
use storefront_sync_integration_tests::{TestContext, cart, failure, ok};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

fn order(status: &str) -> serde_json::Value {
    json!({
        "_id": "o1",
        "userId": "u1",
        "items": [{"productId": "p1", "quantity": 2}],
        "totalPrice": 40,
        "totalItems": 1,
        "totalQuantity": 2,
        "cancellable": true,
        "status": status,
        "createdAt": "2024-05-01T10:00:00.000Z"
    })
}

#[tokio::test]
async fn test_browse_then_checkout_clears_cart() {
    let ctx = TestContext::new().await;
    ctx.login().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .and(query_param("size", "M"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!([
            {"_id": "p1", "title": "Linen shirt", "price": 20, "availableSizes": ["M", "L"]}
        ]))))
        .mount(&ctx.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/u1/cart"))
        .respond_with(ResponseTemplate::new(201).set_body_json(ok(cart("c1", &[("p1", 2)], 40, 1))))
        .mount(&ctx.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/u1/orders"))
        .and(body_json(json!({"cartId": "c1", "cancellable": true})))
        .respond_with(ResponseTemplate::new(201).set_body_json(ok(order("pending"))))
        .expect(1)
        .mount(&ctx.server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/users/u1/cart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": true})))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let filter = ProductFilter {
        size: Some(Size::M),
        ..ProductFilter::default()
    };
    let products = ctx.storefront.catalog().list_products(&filter).await.unwrap();
    assert_eq!(products.len(), 1);

    ctx.storefront
        .cart()
        .add_item(&products[0].id, NonZeroU32::new(2).unwrap())
        .await
        .unwrap();

    let placed = ctx.storefront.orders().place_order(true).await.unwrap();
    assert_eq!(placed.status, OrderStatus::Pending);
    assert!(placed.created_at.is_some());
    assert_eq!(ctx.storefront.orders().orders(), vec![placed]);

    let cart_state = ctx.storefront.cart().snapshot();
    assert!(cart_state.is_empty());
    assert_eq!(cart_state.total_items, 0);
}

#[tokio::test]
async fn test_cancel_updates_recorded_order() {
    let ctx = TestContext::new().await;
    ctx.login().await;
    Mock::given(method("POST"))
        .and(path("/users/u1/cart"))
        .respond_with(ResponseTemplate::new(201).set_body_json(ok(cart("c1", &[("p1", 2)], 40, 1))))
        .mount(&ctx.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/u1/orders"))
        .respond_with(ResponseTemplate::new(201).set_body_json(ok(order("pending"))))
        .mount(&ctx.server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": true})))
        .mount(&ctx.server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/users/u1/orders"))
        .and(body_json(json!({"orderId": "o1", "status": "canceled"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok(order("canceled"))))
        .expect(1)
        .mount(&ctx.server)
        .await;

    ctx.storefront
        .cart()
        .add_item(&ProductId::new("p1"), NonZeroU32::new(2).unwrap())
        .await
        .unwrap();
    let placed = ctx.storefront.orders().place_order(true).await.unwrap();
    ctx.storefront.orders().cancel_order(&placed.id).await.unwrap();

    let orders = ctx.storefront.orders().orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].status, OrderStatus::Canceled);
    assert!(!orders[0].can_cancel());
}

#[tokio::test]
async fn test_checkout_without_cart_fails_fast() {
    let ctx = TestContext::new().await;
    ctx.login().await;
    let before = ctx.request_count().await;

    let err = ctx.storefront.orders().place_order(true).await.unwrap_err();
    assert!(matches!(err, StoreError::CartNotFound));
    assert_eq!(ctx.request_count().await, before);
}

#[tokio::test]
async fn test_rejected_checkout_keeps_cart() {
    let ctx = TestContext::new().await;
    ctx.login().await;
    Mock::given(method("POST"))
        .and(path("/users/u1/cart"))
        .respond_with(ResponseTemplate::new(201).set_body_json(ok(cart("c1", &[("p1", 2)], 40, 1))))
        .mount(&ctx.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/u1/orders"))
        .respond_with(ResponseTemplate::new(400).set_body_json(failure("Cart is empty")))
        .mount(&ctx.server)
        .await;

    ctx.storefront
        .cart()
        .add_item(&ProductId::new("p1"), NonZeroU32::new(2).unwrap())
        .await
        .unwrap();
    let err = ctx.storefront.orders().place_order(true).await.unwrap_err();

    assert_eq!(err.to_string(), "Cart is empty");
    assert_eq!(ctx.storefront.orders().snapshot().error.as_deref(), Some("Cart is empty"));
    assert!(ctx.storefront.orders().orders().is_empty());
    assert!(!ctx.storefront.cart().snapshot().is_empty());
}

#[tokio::test]
async fn test_orders_forgotten_on_logout() {
    let ctx = TestContext::new().await;
    ctx.login().await;
    Mock::given(method("POST"))
        .and(path("/users/u1/cart"))
        .respond_with(ResponseTemplate::new(201).set_body_json(ok(cart("c1", &[("p1", 2)], 40, 1))))
        .mount(&ctx.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/users/u1/orders"))
        .respond_with(ResponseTemplate::new(201).set_body_json(ok(order("pending"))))
        .mount(&ctx.server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": true})))
        .mount(&ctx.server)
        .await;

    ctx.storefront
        .cart()
        .add_item(&ProductId::new("p1"), NonZeroU32::new(2).unwrap())
        .await
        .unwrap();
    ctx.storefront.orders().place_order(false).await.unwrap();
    assert_eq!(ctx.storefront.orders().orders().len(), 1);

    ctx.storefront.session().logout();

    assert!(ctx.storefront.orders().orders().is_empty());
}
