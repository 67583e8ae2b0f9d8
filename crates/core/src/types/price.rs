//! Type-safe price representation using decimal arithmetic.
//!
//! The storefront API sends amounts as JSON numbers alongside a currency id
//! (`"INR"`) and a display symbol (`"₹"`). Amounts are kept as [`Decimal`] so
//! that totals returned by the server are displayed exactly as sent.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with the currency information the backend attaches to products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., rupees, not paise).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_id: String,
    /// Symbol used when formatting the amount.
    pub currency_format: String,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub fn new(amount: Decimal, currency_id: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            amount,
            currency_id: currency_id.into(),
            currency_format: symbol.into(),
        }
    }

    /// Format for display, e.g. `₹1299.00`.
    #[must_use]
    pub fn display(&self) -> String {
        format_amount(&self.currency_format, self.amount)
    }
}

/// Format an amount with a currency symbol and two decimal places.
#[must_use]
pub fn format_amount(symbol: &str, amount: Decimal) -> String {
    format!("{symbol}{:.2}", amount.round_dp(2))
}
