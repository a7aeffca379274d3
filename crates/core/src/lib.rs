//! EcoTrend Core - Shared types and storefront logic.
//!
//! This crate provides the pieces of the storefront that do not depend on
//! HTTP or a runtime:
//!
//! - [`types`] - Newtype IDs, prices, and the catalog [`Product`]
//! - [`cart`] - The [`CartStore`] and its [`CartStorage`] persistence port
//! - [`filter`] - Category and price filtering over the catalog
//! - [`checkout`] - Checkout form validation and the checkout state machine
//!
//! # Architecture
//!
//! The core crate contains only types, traits, and cart/checkout logic - no
//! network access, no runtime dependency, no HTTP. Cart persistence goes
//! through the async [`CartStorage`] port; adapters (file storage, the
//! catalog fetcher, the simulated payment gateway) live in the storefront
//! crate.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod filter;
pub mod types;

pub use cart::{CART_NAMESPACE, CartLine, CartStorage, CartStore, MemoryStorage, StorageError};
pub use checkout::{
    CheckoutError, CheckoutFlow, CheckoutForm, CheckoutOutcome, CheckoutSnapshot, CheckoutState,
    PaymentMethod, Receipt, installment_options,
};
pub use filter::{CategoryFilter, FilterCriteria, category_options, filter_products};
pub use types::*;
