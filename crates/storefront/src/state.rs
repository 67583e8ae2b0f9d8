//! Wiring of every store around one HTTP client and event channel.

use storefront_sync_core::UserId;
use tokio::task::JoinHandle;

use crate::api::{ApiClient, ApiError};
use crate::catalog::Catalog;
use crate::config::ClientConfig;
use crate::events::SessionEvents;
use crate::storage::{DurableStorage, FileStorage};
use crate::stores::{CartStore, OrderStore, SessionStore};

/// The client-side storefront: session, cart, orders and catalog.
///
/// Construction restores persisted state. Logging out resets the cart and
/// orders before [`SessionStore::logout`] returns; a 401 resets them from
/// background tasks that dropping the facade stops. Must be created inside
/// a tokio runtime.
pub struct Storefront {
    api: ApiClient,
    session: SessionStore,
    cart: CartStore,
    orders: OrderStore,
    catalog: Catalog,
    watchers: Vec<JoinHandle<()>>,
}

impl Storefront {
    /// Build the storefront over `storage`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig, storage: DurableStorage) -> Result<Self, ApiError> {
        let api = ApiClient::new(config, storage, SessionEvents::new())?;

        let session = SessionStore::new(api.clone());
        let cart = CartStore::new(api.clone(), config.sequential_mutations);
        let orders = OrderStore::new(api.clone(), cart.clone(), config.sequential_mutations);
        let catalog = Catalog::new(api.clone(), config.product_cache_ttl);

        let logout_cart = cart.clone();
        session.on_logout(move || logout_cart.reset_cart());
        let logout_orders = orders.clone();
        session.on_logout(move || logout_orders.reset());

        let watchers = vec![
            session.watch_unauthorized(),
            cart.follow_session(),
            orders.follow_session(),
        ];

        tracing::debug!(
            api_url = %api.base_url(),
            authenticated = session.is_authenticated(),
            "Storefront ready"
        );

        Ok(Self {
            api,
            session,
            cart,
            orders,
            catalog,
            watchers,
        })
    }

    /// Build the storefront over the JSON state file at `config.state_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn open(config: &ClientConfig) -> Result<Self, ApiError> {
        let storage = DurableStorage::new(FileStorage::open(&config.state_path));
        Self::new(config, storage)
    }

    #[must_use]
    pub const fn session(&self) -> &SessionStore {
        &self.session
    }

    #[must_use]
    pub const fn cart(&self) -> &CartStore {
        &self.cart
    }

    #[must_use]
    pub const fn orders(&self) -> &OrderStore {
        &self.orders
    }

    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The shared HTTP client.
    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    /// User id the cart and order stores act for.
    #[must_use]
    pub fn current_user_id(&self) -> Option<UserId> {
        self.api.storage().user_id()
    }
}

impl Drop for Storefront {
    fn drop(&mut self) {
        for watcher in &self.watchers {
            watcher.abort();
        }
    }
}

impl std::fmt::Debug for Storefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("api", &self.api)
            .field("watchers", &self.watchers.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use storefront_sync_core::{CartId, Credentials};
    use url::Url;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::storage::CartSlice;

    #[tokio::test]
    async fn test_unauthorized_resets_session_and_cart() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"status": false, "message": "jwt expired"})))
            .mount(&server)
            .await;

        let storage = DurableStorage::in_memory();
        storage.set_credentials(&Credentials::new(UserId::new("u1"), "t1"));
        storage.save_cart_slice(&CartSlice {
            cart_id: Some(CartId::new("c1")),
        });
        let config = ClientConfig::new(Url::parse(&server.uri()).unwrap());
        let storefront = Storefront::new(&config, storage.clone()).unwrap();

        storefront.session().fetch_profile().await.unwrap_err();
        assert!(storage.token().is_none());

        for _ in 0..100 {
            if !storefront.session().is_authenticated() && storefront.cart().cart_id().is_none() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(!storefront.session().is_authenticated());
        assert!(storefront.cart().cart_id().is_none());
        assert!(storefront.current_user_id().is_none());
    }

    #[tokio::test]
    async fn test_logout_resets_cart_before_returning() {
        let server = MockServer::start().await;
        let storage = DurableStorage::in_memory();
        storage.set_credentials(&Credentials::new(UserId::new("u1"), "t1"));
        storage.save_cart_slice(&CartSlice {
            cart_id: Some(CartId::new("c1")),
        });
        let config = ClientConfig::new(Url::parse(&server.uri()).unwrap());
        let storefront = Storefront::new(&config, storage.clone()).unwrap();
        assert_eq!(storefront.cart().cart_id(), Some(CartId::new("c1")));

        storefront.session().logout();

        assert!(storefront.cart().cart_id().is_none());
        assert_eq!(storage.cart_slice(), CartSlice::default());
        assert!(storefront.orders().orders().is_empty());
    }

    #[tokio::test]
    async fn test_open_uses_state_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ClientConfig::new(Url::parse("http://localhost:3000").unwrap());
        config.state_path = dir.path().join("state.json");

        {
            let storefront = Storefront::open(&config).unwrap();
            storefront
                .api()
                .storage()
                .set_credentials(&Credentials::new(UserId::new("u1"), "t1"));
        }

        let storefront = Storefront::open(&config).unwrap();
        assert_eq!(storefront.current_user_id(), Some(UserId::new("u1")));
    }
}
