//! Catalog view.

use storefront_sync::Storefront;
use storefront_sync_core::{Product, ProductFilter, ProductId};
use tracing::info;

use super::CliError;

/// List products matching `filter`.
pub async fn list(storefront: &Storefront, filter: &ProductFilter) -> Result<(), CliError> {
    let products = storefront.catalog().list_products(filter).await?;
    info!(count = products.len(), "Products");
    for product in &products {
        print_line(product);
    }
    Ok(())
}

/// Show one product.
pub async fn show(storefront: &Storefront, id: String) -> Result<(), CliError> {
    let product = storefront.catalog().get_product(&ProductId::from(id)).await?;
    print_line(&product);
    if !product.description.is_empty() {
        info!("  {}", product.description);
    }
    let sizes: Vec<&str> = product.available_sizes.iter().map(|s| s.as_str()).collect();
    info!("  sizes: {}", sizes.join(", "));
    if let Some(installments) = product.installments {
        info!("  installments: {installments}");
    }
    if product.is_free_shipping {
        info!("  free shipping");
    }
    Ok(())
}

fn print_line(product: &Product) {
    info!(
        "{}  {}  {}",
        product.id,
        product.title,
        product.unit_price().display()
    );
}
