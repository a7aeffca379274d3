//! Business logic services for storefront.
//!
//! # Services
//!
//! - `catalog` - Product feed loaded once at startup
//! - `checkout` - Checkout driver and simulated payment gateway
//! - `shoppers` - Per-visitor cart, form, and checkout state
//! - `storage` - File-backed cart persistence

pub mod catalog;
pub mod checkout;
pub mod shoppers;
pub mod storage;

pub use catalog::{Catalog, CatalogError, CatalogState};
pub use checkout::{GatewayError, PaymentGateway, SimulatedGateway};
pub use shoppers::{SharedShopper, Shopper, ShopperRegistry};
pub use storage::FileStorage;
