//! Catalog endpoints.

use reqwest::Method;
use storefront_sync_core::{Product, ProductFilter, ProductId};
use tracing::instrument;

use super::{ApiClient, ApiError, ApiRequest};

impl ApiClient {
    /// List products matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, filter))]
    pub async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, ApiError> {
        self.execute(ApiRequest::new(Method::GET, ["products"]).query(filter.query_pairs()))
            .await
    }

    /// Fetch a single product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the product does not exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        self.execute(ApiRequest::new(Method::GET, ["products", id.as_str()]))
            .await
    }
}
