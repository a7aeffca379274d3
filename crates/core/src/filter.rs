//! Catalog filtering by category and price ceiling.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Product;

/// Sentinel category value meaning "every category".
pub const ALL_CATEGORIES: &str = "all";

/// Category selection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    /// Whether a product in `category` passes this filter.
    #[must_use]
    pub fn matches(&self, category: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(selected) => selected == category,
        }
    }

    /// The value used in forms and query strings.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::All => ALL_CATEGORIES,
            Self::Only(selected) => selected,
        }
    }
}

impl From<String> for CategoryFilter {
    fn from(value: String) -> Self {
        if value.is_empty() || value == ALL_CATEGORIES {
            Self::All
        } else {
            Self::Only(value)
        }
    }
}

impl From<CategoryFilter> for String {
    fn from(value: CategoryFilter) -> Self {
        match value {
            CategoryFilter::All => ALL_CATEGORIES.to_string(),
            CategoryFilter::Only(selected) => selected,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-selected narrowing of the catalog view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    pub category: CategoryFilter,
    max_price: Decimal,
}

impl FilterCriteria {
    /// Lowest accepted price ceiling.
    pub const MIN_PRICE: Decimal = Decimal::ZERO;
    /// Highest accepted price ceiling.
    pub const MAX_PRICE: Decimal = Decimal::from_parts(5000, 0, 0, false, 0);

    /// Build criteria, clamping `max_price` into `[MIN_PRICE, MAX_PRICE]`.
    #[must_use]
    pub fn new(category: CategoryFilter, max_price: Decimal) -> Self {
        Self {
            category,
            max_price: max_price.clamp(Self::MIN_PRICE, Self::MAX_PRICE),
        }
    }

    #[must_use]
    pub const fn max_price(&self) -> Decimal {
        self.max_price
    }

    /// Whether `product` passes both predicates.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        self.category.matches(&product.category) && product.price <= self.max_price
    }
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self::new(CategoryFilter::All, Self::MAX_PRICE)
    }
}

/// Products satisfying `criteria`, in catalog order.
#[must_use]
pub fn filter_products<'a>(catalog: &'a [Product], criteria: &FilterCriteria) -> Vec<&'a Product> {
    catalog.iter().filter(|p| criteria.matches(p)).collect()
}

/// Distinct categories in first-appearance order.
///
/// The "all" option is not included; views prepend it themselves.
#[must_use]
pub fn category_options(catalog: &[Product]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for product in catalog {
        if !seen.contains(&product.category.as_str()) {
            seen.push(&product.category);
        }
    }
    seen
}
