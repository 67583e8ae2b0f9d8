//! Order endpoints under `/users/{userId}/orders`.

use reqwest::Method;
use serde::Serialize;
use storefront_sync_core::{CartId, Order, OrderId, OrderStatus, UserId};
use tracing::instrument;

use super::{ApiClient, ApiError, ApiRequest};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateOrderBody<'a> {
    cart_id: &'a CartId,
    cancellable: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateOrderBody<'a> {
    order_id: &'a OrderId,
    status: &'static str,
}

impl ApiClient {
    /// Check out the given cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    #[instrument(skip(self), fields(user_id = %user_id, cart_id = %cart_id))]
    pub async fn create_order(
        &self,
        user_id: &UserId,
        cart_id: &CartId,
        cancellable: bool,
    ) -> Result<Order, ApiError> {
        let request = ApiRequest::new(Method::POST, ["users", user_id.as_str(), "orders"])
            .json(&CreateOrderBody {
                cart_id,
                cancellable,
            })?;
        self.execute(request).await
    }

    /// Move an order to a new status.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the transition is rejected.
    #[instrument(skip(self), fields(user_id = %user_id, order_id = %order_id, status = %status))]
    pub async fn update_order_status(
        &self,
        user_id: &UserId,
        order_id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, ApiError> {
        let request = ApiRequest::new(Method::PUT, ["users", user_id.as_str(), "orders"])
            .json(&UpdateOrderBody {
                order_id,
                status: status.as_str(),
            })?;
        self.execute(request).await
    }
}
