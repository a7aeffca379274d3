//! Catalog product.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// A purchasable product as it appears in the catalog feed.
///
/// The wire format is the catalog's JSON object:
/// `{"id": 1, "name": "...", "category": "...", "price": 99.9, "image": "..."}`.
/// Prices travel as JSON numbers, not strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub image: String,
}

impl Product {
    /// The product's price in the storefront currency.
    #[must_use]
    pub const fn display_price(&self) -> Price {
        Price::brl(self.price)
    }
}
