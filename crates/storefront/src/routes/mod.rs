//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page (filters, grid, cart sidebar)
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (503 while the catalog loads)
//!
//! # Products (HTMX fragments)
//! GET  /products               - Filtered product grid (?category=&max_price=)
//! GET  /products/{id}          - Product detail overlay
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart sidebar
//! POST /cart/add               - Add to cart (returns count, triggers cart-updated)
//! POST /cart/remove            - Remove line (returns sidebar, triggers cart-count-changed)
//! GET  /cart/count             - Cart count badge
//!
//! # Checkout (HTMX fragments)
//! GET  /checkout/installments  - Installment selector for a payment method
//! POST /checkout               - Submit checkout (returns sidebar with outcome)
//! ```

pub mod cart;
pub mod checkout;
pub mod health;
pub mod home;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::grid))
        .route("/{id}", get(products::detail))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(checkout::submit))
        .route("/installments", get(checkout::installments))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
}
