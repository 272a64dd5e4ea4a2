//! Integration tests for `CartSync`.
//!
//! Each test stands up a `wiremock` server for the backend and keeps device
//! state in `MemoryStorage`. Requests the server has no mock for get a 404,
//! which the client treats as an unreachable backend.

use std::sync::Arc;
use std::time::Duration;

use basket_client::storage::{cart_key, DEVICE_ID_KEY};
use basket_client::{Basket, ChangeEvent, Config, KeyValueStorage, MemoryStorage, NoStorage};
use basket_engine::{Cart, CartItem};
use rust_decimal::Decimal;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DEVICE: &str = "dev-1";

/// Basket for an identified device whose storage already holds its id.
fn basket_for(uri: &str) -> (Basket, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    storage
        .set_item(DEVICE_ID_KEY, DEVICE)
        .expect("failed to seed device id");
    let basket =
        Basket::with_storage(&Config::new(uri), storage.clone()).expect("failed to build basket");
    (basket, storage)
}

fn local_cart(basket: &Basket) -> Cart {
    basket.local().get_local(&cart_key(DEVICE), Cart::empty())
}

fn cart_of(items: Vec<CartItem>) -> Cart {
    Cart::from_items(items).expect("cart total fits")
}

fn seed_cart(basket: &Basket, cart: &Cart) {
    assert!(basket.local().set_local(&cart_key(DEVICE), cart));
}

/// Backend cart with one line of `qty` rings at 500.
fn backend_cart(qty: u32, total: serde_json::Value) -> serde_json::Value {
    json!({
        "success": true,
        "data": {
            "cart": {
                "items": [{
                    "_id": "line-1",
                    "product": {
                        "_id": "p1",
                        "name": "Ring",
                        "price": 500,
                        "images": ["/ring.png"]
                    },
                    "quantity": qty
                }],
                "totalAmount": total
            }
        }
    })
}

// ---------------------------------------------------------------------------
// Fetch
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_adopts_backend_cart_and_caches_it() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/cart/dev-1"))
        .and(header("X-Device-Id", DEVICE))
        .respond_with(ResponseTemplate::new(200).set_body_json(backend_cart(2, json!(1000))))
        .expect(1)
        .mount(&server)
        .await;

    let (basket, _) = basket_for(&server.uri());
    let cart = basket.cart().fetch_cart().await;

    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].id, "line-1");
    assert_eq!(cart.items[0].product_id, "p1");
    assert_eq!(cart.items[0].image, "/ring.png");
    assert_eq!(cart.total, Decimal::from(1000));
    assert_eq!(local_cart(&basket), cart);
}

#[tokio::test]
async fn fetch_trusts_backend_total() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/cart/dev-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(backend_cart(2, json!("899.50"))))
        .mount(&server)
        .await;

    let (basket, _) = basket_for(&server.uri());
    let cart = basket.cart().fetch_cart().await;

    assert_eq!(cart.total, Decimal::new(89950, 2));
    assert_ne!(Some(cart.total), cart.computed_total());
}

#[tokio::test]
async fn fetch_falls_back_to_local_cart_when_backend_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/cart/dev-1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (basket, _) = basket_for(&server.uri());
    let seeded = cart_of(vec![CartItem::new("p9", "Chain", Decimal::from(40), "", 3)]);
    seed_cart(&basket, &seeded);

    assert_eq!(basket.cart().fetch_cart().await, seeded);
}

#[tokio::test]
async fn fetch_with_nothing_anywhere_is_empty() {
    let server = MockServer::start().await;
    let (basket, _) = basket_for(&server.uri());

    let cart = basket.cart().fetch_cart().await;
    assert!(cart.is_empty());
    assert_eq!(cart.total, Decimal::ZERO);
}

#[tokio::test]
async fn overflowing_backend_total_falls_back_to_local_cart() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/cart/dev-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cart": {"items": [{
                "productId": "p1",
                "quantity": 2,
                "price": "79228162514264337593543950335"
            }]}
        })))
        .mount(&server)
        .await;

    let (basket, _) = basket_for(&server.uri());
    let seeded = cart_of(vec![CartItem::new("p1", "Ring", Decimal::from(500), "", 1)]);
    seed_cart(&basket, &seeded);

    assert_eq!(basket.cart().fetch_cart().await, seeded);
}

#[tokio::test]
async fn malformed_success_body_falls_back_to_local_cart() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/cart/dev-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let (basket, _) = basket_for(&server.uri());
    let seeded = cart_of(vec![CartItem::new("p1", "Ring", Decimal::from(500), "", 1)]);
    seed_cart(&basket, &seeded);

    assert_eq!(basket.cart().fetch_cart().await, seeded);
}

// ---------------------------------------------------------------------------
// Add / update / remove
// ---------------------------------------------------------------------------

#[tokio::test]
async fn add_sends_body_and_adopts_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/cart/items"))
        .and(header("X-Device-Id", DEVICE))
        .and(body_json(json!({"deviceId": DEVICE, "productId": "p1", "qty": 2})))
        .respond_with(ResponseTemplate::new(200).set_body_json(backend_cart(2, json!(1000))))
        .expect(1)
        .mount(&server)
        .await;

    let (basket, _) = basket_for(&server.uri());
    let cart = basket
        .cart()
        .add_to_cart("p1", "Ring", Decimal::from(500), "/ring.png", 2)
        .await;

    assert_eq!(cart.items[0].id, "line-1");
    assert_eq!(cart.items[0].quantity, 2);
    assert_eq!(local_cart(&basket), cart);
}

#[tokio::test]
async fn offline_adds_accumulate_quantity() {
    let (basket, _) = basket_for("http://127.0.0.1:1");

    basket
        .cart()
        .add_to_cart("p1", "Ring", Decimal::from(500), "/ring.png", 2)
        .await;
    let cart = basket
        .cart()
        .add_to_cart("p1", "Ring", Decimal::from(500), "/ring.png", 1)
        .await;

    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 3);
    assert_eq!(cart.items[0].id, "p1");
    assert_eq!(cart.total, Decimal::from(1500));
    assert_eq!(local_cart(&basket), cart);
}

#[tokio::test]
async fn offline_add_survives_failed_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/cart/items"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/cart/dev-1"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let (basket, _) = basket_for(&server.uri());
    assert!(local_cart(&basket).is_empty());

    basket
        .cart()
        .add_to_cart("p1", "Ring", Decimal::from(500), "/img.png", 2)
        .await;
    let cart = basket.cart().fetch_cart().await;

    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].product_id, "p1");
    assert_eq!(cart.items[0].quantity, 2);
    assert_eq!(cart.items[0].price, Decimal::from(500));
    assert_eq!(cart.total, Decimal::from(1000));
}

#[tokio::test]
async fn offline_overflowing_add_leaves_cart_unchanged() {
    let (basket, _) = basket_for("http://127.0.0.1:1");

    basket
        .cart()
        .add_to_cart("p1", "Ring", Decimal::from(500), "", 2)
        .await;
    let cart = basket
        .cart()
        .add_to_cart("p2", "Vault", Decimal::MAX, "", 2)
        .await;

    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.total, Decimal::from(1000));
    assert_eq!(local_cart(&basket), cart);
}

#[tokio::test]
async fn offline_item_count_saturates() {
    let (basket, _) = basket_for("http://127.0.0.1:1");
    let (_, mut rx) = basket.subscribe();

    basket
        .cart()
        .add_to_cart("p1", "Ring", Decimal::ONE, "", u32::MAX)
        .await;
    let cart = basket
        .cart()
        .add_to_cart("p2", "Chain", Decimal::ONE, "", 1)
        .await;
    assert_eq!(cart.items.len(), 2);

    let mut last = None;
    while let Ok(event) = rx.try_recv() {
        last = Some(event);
    }
    assert!(matches!(
        last,
        Some(ChangeEvent::CartChanged { item_count: u32::MAX, .. })
    ));
}

#[tokio::test]
async fn offline_total_matches_line_sum() {
    let (basket, _) = basket_for("http://127.0.0.1:1");

    basket
        .cart()
        .add_to_cart("p1", "Ring", Decimal::new(1999, 2), "", 3)
        .await;
    let cart = basket
        .cart()
        .add_to_cart("p2", "Chain", Decimal::new(550, 2), "", 2)
        .await;

    assert_eq!(cart.total, Decimal::new(7097, 2));
    assert_eq!(Some(cart.total), cart.computed_total());
}

#[tokio::test]
async fn update_to_zero_removes_line_locally_on_failure() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/cart/items/p1"))
        .and(body_json(json!({"deviceId": DEVICE, "qty": 0})))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let (basket, _) = basket_for(&server.uri());
    seed_cart(
        &basket,
        &cart_of(vec![CartItem::new("p1", "Ring", Decimal::from(500), "", 2)]),
    );

    let cart = basket.cart().update_cart_quantity("p1", 0).await;
    assert!(cart.is_empty());
    assert!(local_cart(&basket).is_empty());
}

#[tokio::test]
async fn update_sets_quantity_locally_on_failure() {
    let (basket, _) = basket_for("http://127.0.0.1:1");
    seed_cart(
        &basket,
        &cart_of(vec![CartItem::new("p1", "Ring", Decimal::from(500), "", 2)]),
    );

    let cart = basket.cart().update_cart_quantity("p1", 5).await;
    assert_eq!(cart.items[0].quantity, 5);
    assert_eq!(cart.total, Decimal::from(2500));
}

#[tokio::test]
async fn remove_deletes_then_refetches() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/cart/items/line-1"))
        .and(query_param("deviceId", DEVICE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/cart/dev-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"cart": {"items": [], "totalAmount": 0}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (basket, _) = basket_for(&server.uri());
    let cart = basket.cart().remove_from_cart("line-1").await;

    assert!(cart.is_empty());
    assert!(local_cart(&basket).is_empty());
}

#[tokio::test]
async fn offline_remove_matches_line_or_product_id() {
    let (basket, _) = basket_for("http://127.0.0.1:1");
    let mut ring = CartItem::new("p1", "Ring", Decimal::from(500), "", 1);
    ring.id = "line-1".to_string();
    let chain = CartItem::new("p2", "Chain", Decimal::from(40), "", 1);
    seed_cart(&basket, &cart_of(vec![ring, chain]));

    let cart = basket.cart().remove_from_cart("p1").await;
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].product_id, "p2");

    let cart = basket.cart().remove_from_cart("p2").await;
    assert!(cart.is_empty());

    // removing again is a no-op
    let cart = basket.cart().remove_from_cart("p2").await;
    assert!(cart.is_empty());
}

// ---------------------------------------------------------------------------
// Clear
// ---------------------------------------------------------------------------

#[tokio::test]
async fn clear_empties_local_cart_even_when_backend_fails() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/cart"))
        .and(query_param("deviceId", DEVICE))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let (basket, _) = basket_for(&server.uri());
    seed_cart(
        &basket,
        &cart_of(vec![CartItem::new("p1", "Ring", Decimal::from(500), "", 2)]),
    );

    basket.cart().clear_cart().await;
    assert!(local_cart(&basket).is_empty());
}

// ---------------------------------------------------------------------------
// Out-of-order responses
// ---------------------------------------------------------------------------

#[tokio::test]
async fn slow_fetch_does_not_overwrite_newer_add() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/cart/dev-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": {"cart": {"items": [], "totalAmount": 0}}}))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/cart/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(backend_cart(1, json!(500))))
        .mount(&server)
        .await;

    let (basket, _) = basket_for(&server.uri());
    let (fetched, added) = tokio::join!(
        basket.cart().fetch_cart(),
        basket
            .cart()
            .add_to_cart("p1", "Ring", Decimal::from(500), "/ring.png", 1),
    );

    assert_eq!(added.items.len(), 1);
    // the stale fetch reports the state already in place
    assert_eq!(fetched, added);
    assert_eq!(local_cart(&basket), added);
}

// ---------------------------------------------------------------------------
// Server context and events
// ---------------------------------------------------------------------------

#[tokio::test]
async fn server_context_never_calls_backend() {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let basket = Basket::with_storage(&Config::new(server.uri()), Arc::new(NoStorage))
        .expect("failed to build basket");
    assert_eq!(basket.device_id(), "server");

    assert!(basket.cart().fetch_cart().await.is_empty());
    let cart = basket
        .cart()
        .add_to_cart("p1", "Ring", Decimal::from(500), "", 2)
        .await;
    assert_eq!(cart.items[0].quantity, 2);

    // nothing was persisted
    assert!(basket.cart().fetch_cart().await.is_empty());
    basket.cart().clear_cart().await;
}

#[tokio::test]
async fn cart_changes_are_published() {
    let (basket, _) = basket_for("http://127.0.0.1:1");
    let (_, mut rx) = basket.subscribe();

    basket
        .cart()
        .add_to_cart("p1", "Ring", Decimal::from(500), "", 2)
        .await;

    let mut last = None;
    while let Ok(event) = rx.try_recv() {
        last = Some(event);
    }
    assert_eq!(
        last,
        Some(ChangeEvent::CartChanged {
            device_id: DEVICE.to_string(),
            item_count: 2,
            total: Decimal::from(1000),
        })
    );
}
