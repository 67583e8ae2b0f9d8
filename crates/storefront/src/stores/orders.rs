//! Checkout and order tracking.
//!
//! The backend has no order listing endpoint, so the store remembers the
//! orders placed or cancelled in this process until the session ends.

use storefront_sync_core::{Order, OrderId, OrderStatus, UserId};
use tokio::task::JoinHandle;
use tracing::instrument;

use super::{CartStore, MutationGate, Snapshot};
use crate::api::ApiClient;
use crate::error::StoreError;
use crate::events;

/// Snapshot of the order store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderState {
    /// Orders in the order they were placed.
    pub orders: Vec<Order>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl OrderState {
    /// Look up a known order.
    #[must_use]
    pub fn get(&self, id: &OrderId) -> Option<&Order> {
        self.orders.iter().find(|o| &o.id == id)
    }

    fn record(&mut self, order: Order) {
        match self.orders.iter_mut().find(|o| o.id == order.id) {
            Some(existing) => *existing = order,
            None => self.orders.push(order),
        }
    }
}

/// Orders placed through `/users/{userId}/orders`.
#[derive(Debug, Clone)]
pub struct OrderStore {
    api: ApiClient,
    cart: CartStore,
    state: Snapshot<OrderState>,
    gate: MutationGate,
}

impl OrderStore {
    /// Create an empty store checking out `cart`.
    #[must_use]
    pub fn new(api: ApiClient, cart: CartStore, sequential_mutations: bool) -> Self {
        Self {
            api,
            cart,
            state: Snapshot::new(OrderState::default()),
            gate: MutationGate::new(sequential_mutations),
        }
    }

    /// Copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> OrderState {
        self.state.get()
    }

    /// Orders known to this process.
    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        self.state.read(|s| s.orders.clone())
    }

    /// Turn the current cart into an order, then clear the cart.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotAuthenticated`] without a stored user id,
    /// [`StoreError::CartNotFound`] without a cached cart id, otherwise the
    /// remote failure. A failure to clear the cart afterwards is logged and
    /// does not fail the checkout.
    #[instrument(skip(self))]
    pub async fn place_order(&self, cancellable: bool) -> Result<Order, StoreError> {
        let user_id = self.user_id()?;
        let _guard = self.gate.enter().await;
        let cart_id = self.cart.cart_id().ok_or(StoreError::CartNotFound)?;
        self.begin();

        let order = match self.api.create_order(&user_id, &cart_id, cancellable).await {
            Ok(order) => order,
            Err(e) => return Err(self.fail(e.into())),
        };

        tracing::info!(order_id = %order.id, total = %order.total_price, "Order placed");
        self.state.update(|s| {
            s.record(order.clone());
            s.is_loading = false;
        });

        if let Err(e) = self.cart.clear_cart().await {
            tracing::warn!(error = %e, "Failed to clear cart after checkout");
        }
        Ok(order)
    }

    /// Cancel an order.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotAuthenticated`] without a stored user id, otherwise
    /// the remote failure.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn cancel_order(&self, order_id: &OrderId) -> Result<Order, StoreError> {
        let user_id = self.user_id()?;
        let _guard = self.gate.enter().await;
        self.begin();

        match self
            .api
            .update_order_status(&user_id, order_id, OrderStatus::Canceled)
            .await
        {
            Ok(order) => {
                tracing::info!(order_id = %order.id, status = %order.status, "Order updated");
                self.state.update(|s| {
                    s.record(order.clone());
                    s.is_loading = false;
                });
                Ok(order)
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    /// Forget every recorded order.
    pub fn reset(&self) {
        self.state.update(|s| *s = OrderState::default());
    }

    /// Clear the last error.
    pub fn clear_error(&self) {
        self.state.update(|s| s.error = None);
    }

    /// Spawn the task that forgets orders whenever the session ends.
    ///
    /// Events arriving after credentials were stored again are ignored.
    #[must_use]
    pub fn follow_session(&self) -> JoinHandle<()> {
        let rx = self.api.events().subscribe();
        let store = self.clone();
        tokio::spawn(events::drive(rx, move |_| {
            if store.api.storage().user_id().is_none() {
                store.reset();
            }
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

    fn fail(&self, error: StoreError) -> StoreError {
        let message = error.to_string();
        self.state.update(|s| {
            s.is_loading = false;
            s.error = Some(message);
        });
        error
    }
}
