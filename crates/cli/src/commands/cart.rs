//! Cart view.

use std::num::NonZeroU32;

use storefront_sync::{CartState, Storefront};
use storefront_sync_core::{ProductId, format_amount};
use tracing::info;

use super::CliError;

const DEFAULT_CURRENCY_SYMBOL: &str = "₹";

/// Fetch and print the cart.
pub async fn show(storefront: &Storefront) -> Result<(), CliError> {
    storefront.cart().fetch_cart().await?;
    print_cart(&storefront.cart().snapshot());
    Ok(())
}

/// Add `quantity` of a product.
pub async fn add(storefront: &Storefront, product_id: String, quantity: u32) -> Result<(), CliError> {
    let quantity = NonZeroU32::new(quantity)
        .ok_or_else(|| CliError::InvalidInput("quantity must be at least 1".to_string()))?;
    storefront
        .cart()
        .add_item(&ProductId::from(product_id), quantity)
        .await?;
    print_cart(&storefront.cart().snapshot());
    Ok(())
}

/// Decrease a product's quantity by one.
pub async fn decrease(storefront: &Storefront, product_id: String) -> Result<(), CliError> {
    storefront
        .cart()
        .decrease_quantity(&ProductId::from(product_id))
        .await?;
    print_cart(&storefront.cart().snapshot());
    Ok(())
}

/// Remove a product's line.
pub async fn remove(storefront: &Storefront, product_id: String) -> Result<(), CliError> {
    storefront
        .cart()
        .remove_item(&ProductId::from(product_id))
        .await?;
    print_cart(&storefront.cart().snapshot());
    Ok(())
}

/// Empty the cart.
pub async fn clear(storefront: &Storefront) -> Result<(), CliError> {
    storefront.cart().clear_cart().await?;
    info!("Cart cleared");
    Ok(())
}

fn print_cart(cart: &CartState) {
    if cart.is_empty() {
        info!("Cart is empty");
        return;
    }

    let symbol = cart
        .items
        .iter()
        .find_map(|item| item.product_id.product())
        .map_or(DEFAULT_CURRENCY_SYMBOL, |p| p.currency_format.as_str());

    for item in &cart.items {
        match item.product_id.product() {
            Some(product) => info!(
                "{} x{}  {}  {}",
                product.id,
                item.quantity,
                product.title,
                product.unit_price().display()
            ),
            None => info!("{} x{}", item.product_id.id(), item.quantity),
        }
    }
    info!(
        cart_id = ?cart.cart_id,
        "{} line(s), total {}",
        cart.total_items,
        format_amount(symbol, cart.total_price)
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use storefront_sync::{ClientConfig, DurableStorage};
    use url::Url;

    use super::*;

    #[tokio::test]
    async fn test_add_rejects_zero_quantity() {
        let storage = DurableStorage::in_memory();
        let config = ClientConfig::new(Url::parse("http://127.0.0.1:9").unwrap());
        let storefront = Storefront::new(&config, storage).unwrap();

        let err = add(&storefront, "p1".to_string(), 0).await.unwrap_err();
        assert!(matches!(err, CliError::InvalidInput(_)));
        assert_eq!(err.to_string(), "Invalid input: quantity must be at least 1");
        assert!(storefront.cart().snapshot().error.is_none());
    }

    #[tokio::test]
    async fn test_add_without_login_is_not_authenticated() {
        let config = ClientConfig::new(Url::parse("http://127.0.0.1:9").unwrap());
        let storefront = Storefront::new(&config, DurableStorage::in_memory()).unwrap();

        let err = add(&storefront, "p1".to_string(), 1).await.unwrap_err();
        assert!(matches!(
            err,
            CliError::Store(storefront_sync::StoreError::NotAuthenticated)
        ));
    }
}
