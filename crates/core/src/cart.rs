//! Shopping cart store with pluggable persistence.
//!
//! [`CartStore`] keeps the lines in memory and writes the complete line list
//! to a [`CartStorage`] after every mutation. Restoring from storage never
//! fails: a missing or unreadable value yields an empty cart.
//!
//! Storage is async so file or network backends never block the caller's
//! executor thread. Mutations await the write before returning, which keeps
//! writes for one cart in order.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Price, Product, ProductId};

/// Storage namespace for persisted carts.
pub const CART_NAMESPACE: &str = "eco_cart";

/// Errors raised by a [`CartStorage`] backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The key cannot be mapped onto the backend.
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    /// The backend is unusable (e.g., a poisoned lock).
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Key-value persistence port for carts.
///
/// Values are opaque strings; the store decides the encoding.
#[async_trait]
pub trait CartStorage: Send + Sync {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn save(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-process storage, mostly useful in tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartStorage for MemoryStorage {
    async fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().map_err(poisoned)?;
        Ok(entries.get(key).cloned())
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

fn poisoned<T>(_: PoisonError<T>) -> StorageError {
    StorageError::Unavailable("memory storage lock poisoned".to_string())
}

/// One product's entry in the cart.
///
/// Serialized as the product's fields plus `qty`, matching what the
/// storefront has always persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(flatten)]
    pub product: Product,
    pub qty: u32,
}

impl CartLine {
    /// Price times quantity.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.product.price * Decimal::from(self.qty)
    }
}

/// A cart synchronized to a [`CartStorage`] backend.
pub struct CartStore {
    storage: Arc<dyn CartStorage>,
    key: String,
    lines: Vec<CartLine>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("key", &self.key)
            .field("lines", &self.lines)
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Restore the cart persisted under `key`.
    ///
    /// Missing, unreadable, or malformed values all produce an empty cart.
    /// Lines with a zero quantity or a repeated product are dropped or
    /// merged so the restored cart upholds the one-line-per-product rule.
    pub async fn restore(storage: Arc<dyn CartStorage>, key: impl Into<String>) -> Self {
        let key = key.into();

        let lines = match storage.load(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<CartLine>>(&raw) {
                Ok(lines) => normalize(lines),
                Err(e) => {
                    tracing::debug!(key = %key, error = %e, "Discarding unparseable cart");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to load cart, starting empty");
                Vec::new()
            }
        };

        Self {
            storage,
            key,
            lines,
        }
    }

    /// Storage key this cart persists under.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Add one unit of `product`.
    ///
    /// Increments the existing line for the product, or appends a new line
    /// with quantity 1.
    pub async fn add(&mut self, product: &Product) {
        if let Some(line) = self.lines.iter_mut().find(|l| l.product.id == product.id) {
            line.qty = line.qty.saturating_add(1);
        } else {
            self.lines.push(CartLine {
                product: product.clone(),
                qty: 1,
            });
        }
        self.persist().await;
    }

    /// Remove the line for `id`. Does nothing if there is none.
    pub async fn remove(&mut self, id: ProductId) {
        let before = self.lines.len();
        self.lines.retain(|l| l.product.id != id);
        if self.lines.len() != before {
            self.persist().await;
        }
    }

    /// Empty the cart.
    pub async fn clear(&mut self) {
        self.lines.clear();
        self.persist().await;
    }

    /// Sum of price times quantity over all lines.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    /// [`Self::total`] in the storefront currency.
    #[must_use]
    pub fn display_total(&self) -> Price {
        Price::brl(self.total())
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.qty).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    async fn persist(&self) {
        let encoded = match serde_json::to_string(&self.lines) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::error!(key = %self.key, error = %e, "Failed to encode cart");
                return;
            }
        };

        if let Err(e) = self.storage.save(&self.key, &encoded).await {
            tracing::warn!(key = %self.key, error = %e, "Failed to persist cart");
        }
    }
}

/// Merge duplicate products and drop empty lines, keeping first-seen order.
fn normalize(lines: Vec<CartLine>) -> Vec<CartLine> {
    let mut merged: Vec<CartLine> = Vec::with_capacity(lines.len());
    for line in lines.into_iter().filter(|l| l.qty > 0) {
        if let Some(existing) = merged.iter_mut().find(|m| m.product.id == line.product.id) {
            existing.qty = existing.qty.saturating_add(line.qty);
        } else {
            merged.push(line);
        }
    }
    merged
}
