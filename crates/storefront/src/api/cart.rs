//! Cart endpoints under `/users/{userId}/cart`.

use std::num::NonZeroU32;

use reqwest::Method;
use serde::Serialize;
use storefront_sync_core::{Cart, CartId, ProductId, UserId};
use tracing::instrument;

use super::{ApiClient, ApiError, ApiRequest};

/// How `PUT /users/{userId}/cart` changes a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartUpdate {
    /// Drop the whole line.
    RemoveLine,
    /// Decrease the line's quantity by one.
    DecrementOne,
}

impl CartUpdate {
    /// Value of the `removeProduct` field. `0` removes the line, `1`
    /// decrements.
    #[must_use]
    pub const fn remove_product_flag(self) -> u8 {
        match self {
            Self::RemoveLine => 0,
            Self::DecrementOne => 1,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddItemBody<'a> {
    product_id: &'a ProductId,
    quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    cart_id: Option<&'a CartId>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateItemBody<'a> {
    cart_id: &'a CartId,
    product_id: &'a ProductId,
    remove_product: u8,
}

fn cart_path(user_id: &UserId) -> [&str; 3] {
    ["users", user_id.as_str(), "cart"]
}

impl ApiClient {
    /// Fetch the user's cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; a user with no cart yields a
    /// 404 status error.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_cart(&self, user_id: &UserId) -> Result<Cart, ApiError> {
        self.execute(ApiRequest::new(Method::GET, cart_path(user_id)))
            .await
    }

    /// Add `quantity` of a product, creating the cart when `cart_id` is `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn add_to_cart(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
        quantity: NonZeroU32,
        cart_id: Option<&CartId>,
    ) -> Result<Cart, ApiError> {
        let request = ApiRequest::new(Method::POST, cart_path(user_id)).json(&AddItemBody {
            product_id,
            quantity: quantity.get(),
            cart_id,
        })?;
        self.execute(request).await
    }

    /// Remove or decrement a line.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    #[instrument(skip(self), fields(user_id = %user_id, cart_id = %cart_id, product_id = %product_id))]
    pub async fn update_cart(
        &self,
        user_id: &UserId,
        cart_id: &CartId,
        product_id: &ProductId,
        update: CartUpdate,
    ) -> Result<Cart, ApiError> {
        let request = ApiRequest::new(Method::PUT, cart_path(user_id)).json(&UpdateItemBody {
            cart_id,
            product_id,
            remove_product: update.remove_product_flag(),
        })?;
        self.execute(request).await
    }

    /// Empty the user's cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn clear_cart(&self, user_id: &UserId) -> Result<(), ApiError> {
        self.execute_status_only(ApiRequest::new(Method::DELETE, cart_path(user_id)))
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::ClientConfig;
    use crate::events::SessionEvents;
    use crate::storage::DurableStorage;

    fn client_for(server: &MockServer) -> ApiClient {
        let config = ClientConfig::new(Url::parse(&server.uri()).unwrap());
        ApiClient::new(&config, DurableStorage::in_memory(), SessionEvents::new()).unwrap()
    }

    fn cart_json() -> serde_json::Value {
        json!({
            "_id": "c1",
            "userId": "u1",
            "items": [{"productId": "p1", "quantity": 2}],
            "totalPrice": 40,
            "totalItems": 1
        })
    }

    #[test]
    fn test_remove_product_flag_follows_backend_convention() {
        assert_eq!(CartUpdate::RemoveLine.remove_product_flag(), 0);
        assert_eq!(CartUpdate::DecrementOne.remove_product_flag(), 1);
    }

    #[tokio::test]
    async fn test_add_without_cart_id_omits_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users/u1/cart"))
            .and(body_json(json!({"productId": "p1", "quantity": 2})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"status": true, "data": cart_json()})))
            .expect(1)
            .mount(&server)
            .await;

        let cart = client_for(&server)
            .add_to_cart(
                &UserId::new("u1"),
                &ProductId::new("p1"),
                NonZeroU32::new(2).unwrap(),
                None,
            )
            .await
            .unwrap();
        assert_eq!(cart.id, CartId::new("c1"));
    }

    #[tokio::test]
    async fn test_update_sends_remove_product_flag() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/users/u1/cart"))
            .and(body_json(json!({"cartId": "c1", "productId": "p1", "removeProduct": 1})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": true, "data": cart_json()})))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .update_cart(
                &UserId::new("u1"),
                &CartId::new("c1"),
                &ProductId::new("p1"),
                CartUpdate::DecrementOne,
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_clear_accepts_envelope_without_data() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/users/u1/cart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": true, "message": "Cart cleared"})))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).clear_cart(&UserId::new("u1")).await.unwrap();
    }
}
