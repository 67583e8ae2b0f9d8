//! Product catalog reader.
//!
//! Listings and product details are cached in memory via `moka`. A TTL of
//! zero disables the cache.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use storefront_sync_core::{Product, ProductFilter, ProductId};
use tracing::{debug, instrument};

use crate::api::{ApiClient, ApiError};

const MAX_CACHED_ENTRIES: u64 = 1000;

/// Cache key for listings and product details.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Product(ProductId),
    Products(ProductFilter),
}

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    Product(Box<Product>),
    Products(Arc<Vec<Product>>),
}

/// Read-only access to `/products`.
#[derive(Clone)]
pub struct Catalog {
    api: ApiClient,
    cache: Option<Cache<CacheKey, CacheValue>>,
}

impl Catalog {
    /// Create a catalog caching responses for `ttl`.
    #[must_use]
    pub fn new(api: ApiClient, ttl: Duration) -> Self {
        let cache = (!ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(MAX_CACHED_ENTRIES)
                .time_to_live(ttl)
                .build()
        });
        Self { api, cache }
    }

    /// List products matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, filter))]
    pub async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, ApiError> {
        let key = CacheKey::Products(filter.clone());
        if let Some(CacheValue::Products(products)) = self.cached(&key).await {
            debug!("Cache hit for product listing");
            return Ok(products.as_ref().clone());
        }

        let products = self.api.list_products(filter).await?;
        self.store(key, CacheValue::Products(Arc::new(products.clone())))
            .await;
        Ok(products)
    }

    /// Fetch one product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the product does not exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let key = CacheKey::Product(id.clone());
        if let Some(CacheValue::Product(product)) = self.cached(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product = self.api.get_product(id).await?;
        self.store(key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    /// Drop every cached response.
    pub fn invalidate(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate_all();
        }
    }

    async fn cached(&self, key: &CacheKey) -> Option<CacheValue> {
        match &self.cache {
            Some(cache) => cache.get(key).await,
            None => None,
        }
    }

    async fn store(&self, key: CacheKey, value: CacheValue) {
        if let Some(cache) = &self.cache {
            cache.insert(key, value).await;
        }
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("cached", &self.cache.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use storefront_sync_core::Size;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::ClientConfig;
    use crate::events::SessionEvents;
    use crate::storage::DurableStorage;

    fn catalog_for(server: &MockServer, ttl: Duration) -> Catalog {
        let config = ClientConfig::new(Url::parse(&server.uri()).unwrap());
        let api = ApiClient::new(&config, DurableStorage::in_memory(), SessionEvents::new()).unwrap();
        Catalog::new(api, ttl)
    }

    async fn mount_product(server: &MockServer, expected_calls: u64) {
        Mock::given(method("GET"))
            .and(path("/products/p1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": true,
                "data": {"_id": "p1", "title": "Tee", "price": 20}
            })))
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_product_is_cached() {
        let server = MockServer::start().await;
        mount_product(&server, 1).await;

        let catalog = catalog_for(&server, Duration::from_secs(60));
        let first = catalog.get_product(&ProductId::new("p1")).await.unwrap();
        let second = catalog.get_product(&ProductId::new("p1")).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_zero_ttl_disables_cache() {
        let server = MockServer::start().await;
        mount_product(&server, 2).await;

        let catalog = catalog_for(&server, Duration::ZERO);
        catalog.get_product(&ProductId::new("p1")).await.unwrap();
        catalog.get_product(&ProductId::new("p1")).await.unwrap();
    }

    #[tokio::test]
    async fn test_listing_cached_per_filter_and_invalidated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": true, "data": []})))
            .expect(3)
            .mount(&server)
            .await;

        let catalog = catalog_for(&server, Duration::from_secs(60));
        let all = ProductFilter::default();
        let medium = ProductFilter {
            size: Some(Size::M),
            ..ProductFilter::default()
        };

        catalog.list_products(&all).await.unwrap();
        catalog.list_products(&all).await.unwrap();
        catalog.list_products(&medium).await.unwrap();

        catalog.invalidate();
        catalog.list_products(&all).await.unwrap();
    }
}
