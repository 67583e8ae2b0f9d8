//! Order types as returned by `/users/{userId}/orders`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cart::LineItem;
use super::id::{OrderId, UserId};
use super::status::OrderStatus;

/// An order created from a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub total_price: Decimal,
    #[serde(default)]
    pub total_items: u32,
    /// Sum of quantities across all lines.
    #[serde(default)]
    pub total_quantity: u32,
    #[serde(default)]
    pub cancellable: bool,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Whether the customer may still cancel this order.
    #[must_use]
    pub const fn can_cancel(&self) -> bool {
        self.cancellable && self.status.is_open()
    }
}
