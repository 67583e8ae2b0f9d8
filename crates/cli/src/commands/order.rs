//! Checkout.

use storefront_sync::Storefront;
use storefront_sync_core::{Order, OrderId};
use tracing::info;

use super::CliError;

/// Turn the cart into an order.
pub async fn place(storefront: &Storefront, cancellable: bool) -> Result<(), CliError> {
    // A fresh process only knows the cart id if the cart was fetched before.
    if storefront.cart().cart_id().is_none() {
        storefront.cart().fetch_cart().await?;
    }

    let order = storefront.orders().place_order(cancellable).await?;
    print_order(&order);
    Ok(())
}

/// Cancel an order.
pub async fn cancel(storefront: &Storefront, order_id: String) -> Result<(), CliError> {
    let order = storefront
        .orders()
        .cancel_order(&OrderId::from(order_id))
        .await?;
    print_order(&order);
    Ok(())
}

fn print_order(order: &Order) {
    info!(
        order_id = %order.id,
        status = %order.status,
        cancellable = order.can_cancel(),
        "{} item(s), quantity {}, total {}",
        order.total_items,
        order.total_quantity,
        order.total_price
    );
}
