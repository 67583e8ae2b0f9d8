//! Product catalog types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// Garment sizes offered by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Size {
    S,
    XS,
    M,
    X,
    L,
    XXL,
    XL,
}

impl Size {
    /// Wire value used in query strings and payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::S => "S",
            Self::XS => "XS",
            Self::M => "M",
            Self::X => "X",
            Self::L => "L",
            Self::XXL => "XXL",
            Self::XL => "XL",
        }
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Size {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "S" => Ok(Self::S),
            "XS" => Ok(Self::XS),
            "M" => Ok(Self::M),
            "X" => Ok(Self::X),
            "L" => Ok(Self::L),
            "XXL" => Ok(Self::XXL),
            "XL" => Ok(Self::XL),
            _ => Err(format!("invalid size: {s}")),
        }
    }
}

/// A product as returned by `GET /products` and `GET /products/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default = "default_currency_id")]
    pub currency_id: String,
    #[serde(default = "default_currency_format")]
    pub currency_format: String,
    #[serde(default)]
    pub is_free_shipping: bool,
    #[serde(default)]
    pub product_image: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub available_sizes: Vec<Size>,
    #[serde(default)]
    pub installments: Option<u32>,
    #[serde(default)]
    pub is_deleted: bool,
}

fn default_currency_id() -> String {
    "INR".to_string()
}

fn default_currency_format() -> String {
    "₹".to_string()
}

impl Product {
    /// The product's price together with its currency.
    #[must_use]
    pub fn unit_price(&self) -> Price {
        Price::new(self.price, &self.currency_id, &self.currency_format)
    }
}

/// Sort direction for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceSort {
    Ascending,
    Descending,
}

impl PriceSort {
    /// Query-string value understood by the backend (`1` / `-1`).
    #[must_use]
    pub const fn as_query_value(self) -> &'static str {
        match self {
            Self::Ascending => "1",
            Self::Descending => "-1",
        }
    }
}

/// Filters for `GET /products`. Unset fields are omitted from the query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ProductFilter {
    pub name: Option<String>,
    pub size: Option<Size>,
    pub price_greater_than: Option<Decimal>,
    pub price_less_than: Option<Decimal>,
    pub price_sort: Option<PriceSort>,
}

impl ProductFilter {
    /// Query parameters in the order the backend documents them.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            pairs.push(("name", name.to_string()));
        }
        if let Some(size) = self.size {
            pairs.push(("size", size.to_string()));
        }
        if let Some(min) = self.price_greater_than {
            pairs.push(("priceGreaterThan", min.to_string()));
        }
        if let Some(max) = self.price_less_than {
            pairs.push(("priceLessThan", max.to_string()));
        }
        if let Some(sort) = self.price_sort {
            pairs.push(("priceSort", sort.as_query_value().to_string()));
        }
        pairs
    }
}
