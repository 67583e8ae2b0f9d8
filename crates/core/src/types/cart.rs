//! Cart types as returned by `/users/{userId}/cart`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{CartId, ProductId, UserId};
use super::product::Product;

/// Reference to a product inside a cart or order line.
///
/// The backend returns a bare id unless it populated the product, in which
/// case the full product snapshot is embedded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductRef {
    Id(ProductId),
    Product(Box<Product>),
}

impl ProductRef {
    /// The referenced product's ID, whichever form it arrived in.
    #[must_use]
    pub fn id(&self) -> &ProductId {
        match self {
            Self::Id(id) => id,
            Self::Product(product) => &product.id,
        }
    }

    /// The embedded product, if the backend populated it.
    #[must_use]
    pub fn product(&self) -> Option<&Product> {
        match self {
            Self::Id(_) => None,
            Self::Product(product) => Some(product),
        }
    }
}

/// One product-quantity pair within a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: ProductRef,
    pub quantity: u32,
}

/// The remote cart record.
///
/// `total_price` and `total_items` are authoritative; clients never derive
/// them from `items`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[serde(rename = "_id")]
    pub id: CartId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub total_price: Decimal,
    /// Number of distinct line items.
    #[serde(default)]
    pub total_items: u32,
}
