//! Integration tests for the storefront sync client.
//!
//! Every test drives a full [`Storefront`] against a `wiremock` backend that
//! speaks the storefront REST envelope.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p storefront-sync-integration-tests
//! ```

use std::time::Duration;

use secrecy::SecretString;
use serde_json::{Value, json};
use storefront_sync::{ClientConfig, DurableStorage, Storefront};
use storefront_sync_core::Email;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// User id the mock backend hands out on login.
pub const USER_ID: &str = "u1";

/// Token the mock backend hands out on login.
pub const TOKEN: &str = "t1";

/// A mock backend plus a storefront pointed at it.
pub struct TestContext {
    pub server: MockServer,
    pub config: ClientConfig,
    pub storage: DurableStorage,
    pub storefront: Storefront,
}

impl TestContext {
    /// Start a backend and a storefront over in-memory storage.
    pub async fn new() -> Self {
        Self::with_storage(DurableStorage::in_memory()).await
    }

    /// Start a backend and a storefront over `storage`.
    pub async fn with_storage(storage: DurableStorage) -> Self {
        let server = MockServer::start().await;
        let config = config_for(&server);
        let storefront =
            Storefront::new(&config, storage.clone()).expect("Failed to build storefront");
        Self {
            server,
            config,
            storage,
            storefront,
        }
    }

    /// Log in as [`USER_ID`] through the mocked login and profile endpoints.
    pub async fn login(&self) {
        mount_login(&self.server).await;
        mount_profile(&self.server).await;
        self.storefront
            .session()
            .login(&email(), &password())
            .await
            .expect("Login failed");
    }

    /// Requests the backend has seen so far.
    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .expect("Request recording is disabled")
            .len()
    }
}

/// Client configuration pointing at `server` with caching disabled.
pub fn config_for(server: &MockServer) -> ClientConfig {
    let mut config =
        ClientConfig::new(Url::parse(&server.uri()).expect("Mock server URI is not a URL"));
    config.product_cache_ttl = Duration::ZERO;
    config
}

/// Login email used throughout.
pub fn email() -> Email {
    Email::parse("a@b.com").expect("Test email is valid")
}

/// Login password used throughout.
pub fn password() -> SecretString {
    SecretString::from("Secret1!")
}

/// Successful envelope around `data`.
pub fn ok(data: Value) -> Value {
    json!({"status": true, "data": data})
}

/// Failed envelope with `message`.
pub fn failure(message: &str) -> Value {
    json!({"status": false, "message": message})
}

/// Cart document as the backend returns it.
pub fn cart(id: &str, items: &[(&str, u32)], total_price: u32, total_items: u32) -> Value {
    let items: Vec<Value> = items
        .iter()
        .map(|(product_id, quantity)| json!({"productId": product_id, "quantity": quantity}))
        .collect();
    json!({
        "_id": id,
        "userId": USER_ID,
        "items": items,
        "totalPrice": total_price,
        "totalItems": total_items
    })
}

/// Mount `POST /login` returning [`USER_ID`] and [`TOKEN`].
pub async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(ok(json!({"userId": USER_ID, "token": TOKEN}))),
        )
        .mount(server)
        .await;
}

/// Mount `GET /user/u1/profile`.
pub async fn mount_profile(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("/user/{USER_ID}/profile")))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!({
            "_id": USER_ID,
            "fname": "Ada",
            "lname": "Lovelace",
            "email": "a@b.com"
        }))))
        .mount(server)
        .await;
}

/// Poll `condition` until it holds or a second passes.
///
/// Session-ended resets run on background tasks.
pub async fn eventually(condition: impl Fn() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}
