//! Shopping cart store.
//!
//! The user id always comes from durable storage, never from the session
//! store, so a cart operation right after logout fails without a request.
//! Totals are taken from the server verbatim.

use std::num::NonZeroU32;

use rust_decimal::Decimal;
use storefront_sync_core::{Cart, CartId, LineItem, ProductId, UserId};
use tokio::task::JoinHandle;
use tracing::instrument;

use super::{MutationGate, Snapshot};
use crate::api::{ApiClient, CartUpdate};
use crate::error::StoreError;
use crate::events;
use crate::storage::CartSlice;

/// Snapshot of the cart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartState {
    /// Remote cart id, kept as a hint across restarts.
    pub cart_id: Option<CartId>,
    /// Lines in the order the server returned them.
    pub items: Vec<LineItem>,
    pub total_price: Decimal,
    /// Number of distinct lines.
    pub total_items: u32,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl CartState {
    /// Whether the cart holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Quantity of `product_id` in the cart, zero when absent.
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId) -> u32 {
        self.items
            .iter()
            .filter(|item| item.product_id.id() == product_id)
            .map(|item| item.quantity)
            .sum()
    }
}

/// Cart contents synchronized with `/users/{userId}/cart`.
#[derive(Debug, Clone)]
pub struct CartStore {
    api: ApiClient,
    state: Snapshot<CartState>,
    gate: MutationGate,
}

impl CartStore {
    /// Create the store, restoring the cart id from the `cart-storage` slice.
    #[must_use]
    pub fn new(api: ApiClient, sequential_mutations: bool) -> Self {
        let restored = CartState {
            cart_id: api.storage().cart_slice().cart_id,
            ..CartState::default()
        };
        Self {
            api,
            state: Snapshot::new(restored),
            gate: MutationGate::new(sequential_mutations),
        }
    }

    /// Copy of the current cart.
    #[must_use]
    pub fn snapshot(&self) -> CartState {
        self.state.get()
    }

    /// Cached cart id.
    #[must_use]
    pub fn cart_id(&self) -> Option<CartId> {
        self.state.read(|s| s.cart_id.clone())
    }

    /// Load the cart. A user without a cart gets the empty state.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotAuthenticated`] without a stored user id, otherwise
    /// any remote failure except 404.
    #[instrument(skip(self))]
    pub async fn fetch_cart(&self) -> Result<(), StoreError> {
        let user_id = self.user_id()?;
        self.begin();

        match self.api.get_cart(&user_id).await {
            Ok(cart) => {
                self.apply(cart);
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                tracing::debug!(user_id = %user_id, "No cart yet");
                self.reset_cart();
                Ok(())
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    /// Add `quantity` of a product. The server creates the cart if needed.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotAuthenticated`] without a stored user id, otherwise
    /// the remote failure.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_item(
        &self,
        product_id: &ProductId,
        quantity: NonZeroU32,
    ) -> Result<(), StoreError> {
        let user_id = self.user_id()?;
        let _guard = self.gate.enter().await;
        let cart_id = self.cart_id();
        self.begin();

        match self
            .api
            .add_to_cart(&user_id, product_id, quantity, cart_id.as_ref())
            .await
        {
            Ok(cart) => {
                self.apply(cart);
                Ok(())
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    /// Remove or decrement a line.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotAuthenticated`] without a stored user id,
    /// [`StoreError::CartNotFound`] without a cached cart id, otherwise the
    /// remote failure.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn update_item(
        &self,
        product_id: &ProductId,
        update: CartUpdate,
    ) -> Result<(), StoreError> {
        let user_id = self.user_id()?;
        let _guard = self.gate.enter().await;
        let cart_id = self.cart_id().ok_or(StoreError::CartNotFound)?;
        self.begin();

        match self
            .api
            .update_cart(&user_id, &cart_id, product_id, update)
            .await
        {
            Ok(cart) => {
                self.apply(cart);
                Ok(())
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    /// Drop a product's line entirely.
    ///
    /// # Errors
    ///
    /// See [`CartStore::update_item`].
    pub async fn remove_item(&self, product_id: &ProductId) -> Result<(), StoreError> {
        self.update_item(product_id, CartUpdate::RemoveLine).await
    }

    /// Decrease a product's quantity by one.
    ///
    /// # Errors
    ///
    /// See [`CartStore::update_item`].
    pub async fn decrease_quantity(&self, product_id: &ProductId) -> Result<(), StoreError> {
        self.update_item(product_id, CartUpdate::DecrementOne).await
    }

    /// Empty the cart on the server. The cart id is kept.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotAuthenticated`] without a stored user id, otherwise
    /// the remote failure.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<(), StoreError> {
        let user_id = self.user_id()?;
        let _guard = self.gate.enter().await;
        self.begin();

        match self.api.clear_cart(&user_id).await {
            Ok(()) => {
                self.state.update(|s| {
                    s.items.clear();
                    s.total_price = Decimal::ZERO;
                    s.total_items = 0;
                    s.is_loading = false;
                });
                tracing::info!(user_id = %user_id, "Cart cleared");
                Ok(())
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    /// Forget everything, including the cart id.
    pub fn reset_cart(&self) {
        self.state.update(|s| *s = CartState::default());
        self.api.storage().save_cart_slice(&CartSlice::default());
    }

    /// Clear the last error.
    pub fn clear_error(&self) {
        self.state.update(|s| s.error = None);
    }

    /// Spawn the task that resets the cart whenever the session ends.
    ///
    /// An event that arrives after a new login stored credentials again is
    /// ignored. Callers that log out and straight back in should reset the
    /// cart synchronously, e.g. through [`SessionStore::on_logout`].
    ///
    /// [`SessionStore::on_logout`]: super::SessionStore::on_logout
    #[must_use]
    pub fn follow_session(&self) -> JoinHandle<()> {
        let rx = self.api.events().subscribe();
        let store = self.clone();
        tokio::spawn(events::drive(rx, move |event| {
            if store.api.storage().user_id().is_some() {
                tracing::debug!(?event, "Session already re-established, keeping cart");
                return;
            }
            tracing::debug!(?event, "Resetting cart");
            store.reset_cart();
        }))
    }

    fn user_id(&self) -> Result<UserId, StoreError> {
        self.api
            .storage()
            .user_id()
            .ok_or(StoreError::NotAuthenticated)
    }

    fn begin(&self) {
        self.state.update(|s| {
            s.is_loading = true;
            s.error = None;
        });
    }

    /// Replace the snapshot with the server's cart.
    fn apply(&self, cart: Cart) {
        let slice = CartSlice {
            cart_id: Some(cart.id.clone()),
        };
        self.state.update(|s| {
            *s = CartState {
                cart_id: Some(cart.id),
                items: cart.items,
                total_price: cart.total_price,
                total_items: cart.total_items,
                is_loading: false,
                error: None,
            };
        });
        self.api.storage().save_cart_slice(&slice);
    }

    fn fail(&self, error: StoreError) -> StoreError {
        let message = error.to_string();
        tracing::warn!(error = %message, "Cart operation failed");
        self.state.update(|s| {
            s.is_loading = false;
            s.error = Some(message);
        });
        error
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use storefront_sync_core::Credentials;
    use url::Url;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::ClientConfig;
    use crate::events::{SessionEvent, SessionEvents};
    use crate::storage::DurableStorage;

    fn logged_in_storage() -> DurableStorage {
        let storage = DurableStorage::in_memory();
        storage.set_credentials(&Credentials::new(UserId::new("u1"), "t1"));
        storage
    }

    fn store_for(server: &MockServer, storage: DurableStorage) -> CartStore {
        let config = ClientConfig::new(Url::parse(&server.uri()).unwrap());
        CartStore::new(
            ApiClient::new(&config, storage, SessionEvents::new()).unwrap(),
            false,
        )
    }

    fn cart_body(items: serde_json::Value, total_price: u32, total_items: u32) -> serde_json::Value {
        json!({"status": true, "data": {
            "_id": "c1", "userId": "u1", "items": items,
            "totalPrice": total_price, "totalItems": total_items
        }})
    }

    fn one(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    #[tokio::test]
    async fn test_add_item_without_cart_id_adopts_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users/u1/cart"))
            .and(body_json(json!({"productId": "p1", "quantity": 2})))
            .respond_with(ResponseTemplate::new(201).set_body_json(cart_body(
                json!([{"productId": "p1", "quantity": 2}]),
                40,
                1,
            )))
            .expect(1)
            .mount(&server)
            .await;

        let storage = logged_in_storage();
        let store = store_for(&server, storage.clone());
        store.add_item(&ProductId::new("p1"), one(2)).await.unwrap();

        let state = store.snapshot();
        assert_eq!(state.cart_id, Some(CartId::new("c1")));
        assert_eq!(state.total_items, 1);
        assert_eq!(state.total_price, Decimal::new(40, 0));
        assert_eq!(state.quantity_of(&ProductId::new("p1")), 2);
        assert_eq!(storage.cart_slice().cart_id, Some(CartId::new("c1")));
    }

    #[tokio::test]
    async fn test_totals_are_never_recomputed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201).set_body_json(cart_body(
                json!([{"productId": "p1", "quantity": 5}]),
                7,
                3,
            )))
            .mount(&server)
            .await;

        let store = store_for(&server, logged_in_storage());
        store.add_item(&ProductId::new("p1"), one(1)).await.unwrap();

        let state = store.snapshot();
        assert_eq!(state.total_items, 3);
        assert_eq!(state.total_price, Decimal::new(7, 0));
    }

    #[tokio::test]
    async fn test_mutations_fail_fast_without_user() {
        let server = MockServer::start().await;
        let store = store_for(&server, DurableStorage::in_memory());

        let err = store.add_item(&ProductId::new("p1"), one(1)).await.unwrap_err();
        assert!(matches!(err, StoreError::NotAuthenticated));
        assert!(matches!(
            store.fetch_cart().await.unwrap_err(),
            StoreError::NotAuthenticated
        ));
        assert!(matches!(
            store.clear_cart().await.unwrap_err(),
            StoreError::NotAuthenticated
        ));
        assert!(store.snapshot().error.is_none());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_without_cart_id_fails_fast() {
        let server = MockServer::start().await;
        let store = store_for(&server, logged_in_storage());

        let err = store.remove_item(&ProductId::new("p1")).await.unwrap_err();
        assert!(matches!(err, StoreError::CartNotFound));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_404_matches_reset() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"status": false, "message": "Cart not found"})),
            )
            .mount(&server)
            .await;

        let storage = logged_in_storage();
        storage.save_cart_slice(&CartSlice {
            cart_id: Some(CartId::new("stale")),
        });
        let store = store_for(&server, storage.clone());
        assert_eq!(store.cart_id(), Some(CartId::new("stale")));

        store.fetch_cart().await.unwrap();
        assert_eq!(store.snapshot(), CartState::default());
        assert_eq!(storage.cart_slice(), CartSlice::default());
    }

    #[tokio::test]
    async fn test_fetch_failure_sets_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({"status": false, "message": "Database down"})),
            )
            .mount(&server)
            .await;

        let store = store_for(&server, logged_in_storage());
        store.fetch_cart().await.unwrap_err();

        let state = store.snapshot();
        assert_eq!(state.error.as_deref(), Some("Database down"));
        assert!(!state.is_loading);

        store.clear_error();
        assert!(store.snapshot().error.is_none());
    }

    #[tokio::test]
    async fn test_decrease_last_unit_empties_cart() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(cart_body(
                json!([{"productId": "p1", "quantity": 1}]),
                20,
                1,
            )))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(body_json(json!({"cartId": "c1", "productId": "p1", "removeProduct": 1})))
            .respond_with(ResponseTemplate::new(200).set_body_json(cart_body(json!([]), 0, 0)))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_for(&server, logged_in_storage());
        store.fetch_cart().await.unwrap();
        store.decrease_quantity(&ProductId::new("p1")).await.unwrap();

        let state = store.snapshot();
        assert!(state.is_empty());
        assert_eq!(state.total_items, 0);
        assert_eq!(state.cart_id, Some(CartId::new("c1")));
    }

    #[tokio::test]
    async fn test_clear_keeps_cart_id_and_reset_drops_it() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201).set_body_json(cart_body(
                json!([{"productId": "p1", "quantity": 2}]),
                40,
                1,
            )))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": true})))
            .mount(&server)
            .await;

        let store = store_for(&server, logged_in_storage());
        store.add_item(&ProductId::new("p1"), one(2)).await.unwrap();
        store.clear_cart().await.unwrap();

        let state = store.snapshot();
        assert!(state.is_empty());
        assert_eq!(state.total_price, Decimal::ZERO);
        assert_eq!(state.cart_id, Some(CartId::new("c1")));

        store.reset_cart();
        assert!(store.cart_id().is_none());
    }

    #[tokio::test]
    async fn test_follow_session_resets_on_logout_event() {
        let server = MockServer::start().await;
        let storage = logged_in_storage();
        storage.save_cart_slice(&CartSlice {
            cart_id: Some(CartId::new("c1")),
        });
        let events = SessionEvents::new();
        let config = ClientConfig::new(Url::parse(&server.uri()).unwrap());
        let store = CartStore::new(
            ApiClient::new(&config, storage.clone(), events.clone()).unwrap(),
            false,
        );
        let watcher = store.follow_session();

        storage.clear_credentials();
        events.publish(SessionEvent::LoggedOut);
        for _ in 0..100 {
            if store.cart_id().is_none() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        assert!(store.cart_id().is_none());
        watcher.abort();
    }

    #[tokio::test]
    async fn test_late_session_event_spares_new_login_cart() {
        let server = MockServer::start().await;
        let storage = logged_in_storage();
        storage.save_cart_slice(&CartSlice {
            cart_id: Some(CartId::new("c2")),
        });
        let events = SessionEvents::new();
        let config = ClientConfig::new(Url::parse(&server.uri()).unwrap());
        let store = CartStore::new(
            ApiClient::new(&config, storage, events.clone()).unwrap(),
            false,
        );
        let watcher = store.follow_session();

        // Delivered after the user logged back in.
        events.publish(SessionEvent::LoggedOut);
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        assert_eq!(store.cart_id(), Some(CartId::new("c2")));
        watcher.abort();
    }

    #[tokio::test]
    async fn test_clear_ignores_envelope_on_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(cart_body(
                json!([{"productId": "p1", "quantity": 2}]),
                40,
                1,
            )))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/users/u1/cart"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": false, "message": "Cart is already empty"})),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/users/u1/cart"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let store = store_for(&server, logged_in_storage());
        for _ in 0..2 {
            store.fetch_cart().await.unwrap();
            assert!(!store.snapshot().is_empty());

            store.clear_cart().await.unwrap();

            let state = store.snapshot();
            assert!(state.is_empty());
            assert_eq!(state.total_items, 0);
            assert!(state.error.is_none());
            assert_eq!(state.cart_id, Some(CartId::new("c1")));
        }
    }
}
