//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! Each visitor's cart is keyed by the cart token in their session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{AppendHeaders, IntoResponse, Response},
};
use ecotrend_core::{CartStore, ProductId};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::Visitor;
use crate::routes::checkout::CheckoutView;
use crate::state::AppState;

/// Fired after an item is added; the sidebar refreshes itself.
pub const CART_UPDATED_EVENT: &str = "cart-updated";

/// Fired when a response already carries the new sidebar; only the badge refreshes.
pub const CART_COUNT_CHANGED_EVENT: &str = "cart-count-changed";

/// Cart item display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub id: i32,
    pub name: String,
    pub image: String,
    pub quantity: u32,
    pub line_price: String,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total: String,
    pub item_count: u32,
}

impl From<&CartStore> for CartView {
    fn from(cart: &CartStore) -> Self {
        Self {
            items: cart
                .lines()
                .iter()
                .map(|line| CartItemView {
                    id: line.product.id.as_i32(),
                    name: line.product.name.clone(),
                    image: line.product.image.clone(),
                    quantity: line.qty,
                    line_price: ecotrend_core::Price::brl(line.subtotal()).to_string(),
                })
                .collect(),
            total: cart.display_total().to_string(),
            item_count: cart.item_count(),
        }
    }
}

/// Form data naming a product.
#[derive(Debug, Deserialize)]
pub struct CartProductForm {
    pub product_id: String,
}

impl CartProductForm {
    fn product_id(&self) -> Result<ProductId> {
        self.product_id
            .parse()
            .map_err(|_| AppError::BadRequest(format!("invalid product id: {}", self.product_id)))
    }
}

/// Cart sidebar fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_sidebar.html")]
pub struct CartSidebarTemplate {
    pub cart: CartView,
    pub checkout: CheckoutView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Display the cart sidebar.
#[instrument(skip_all)]
pub async fn show(Visitor(shopper): Visitor) -> impl IntoResponse {
    let shopper = shopper.lock().await;

    CartSidebarTemplate {
        cart: CartView::from(&shopper.cart),
        checkout: CheckoutView::from_shopper(&shopper),
    }
}

/// Add one unit of a product to the cart (HTMX).
///
/// Returns the updated count badge and triggers a sidebar refresh.
#[instrument(skip(state, shopper))]
pub async fn add(
    State(state): State<AppState>,
    Visitor(shopper): Visitor,
    Form(form): Form<CartProductForm>,
) -> Result<Response> {
    let product_id = form.product_id()?;
    let product = state
        .catalog()
        .find(product_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;

    let count = {
        let mut shopper = shopper.lock().await;
        shopper.cart.add(&product).await;
        shopper.cart.item_count()
    };
    tracing::debug!(%product_id, count, "Added to cart");

    Ok((
        AppendHeaders([("HX-Trigger", CART_UPDATED_EVENT)]),
        CartCountTemplate { count },
    )
        .into_response())
}

/// Remove a product's line from the cart (HTMX).
///
/// Removing a product that is not in the cart is not an error.
#[instrument(skip(shopper))]
pub async fn remove(
    Visitor(shopper): Visitor,
    Form(form): Form<CartProductForm>,
) -> Result<Response> {
    let product_id = form.product_id()?;

    let mut shopper = shopper.lock().await;
    shopper.cart.remove(product_id).await;

    Ok((
        AppendHeaders([("HX-Trigger", CART_COUNT_CHANGED_EVENT)]),
        CartSidebarTemplate {
            cart: CartView::from(&shopper.cart),
            checkout: CheckoutView::from_shopper(&shopper),
        },
    )
        .into_response())
}

/// Cart count badge (HTMX).
#[instrument(skip_all)]
pub async fn count(Visitor(shopper): Visitor) -> impl IntoResponse {
    let count = shopper.lock().await.cart.item_count();
    CartCountTemplate { count }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ecotrend_core::{CART_NAMESPACE, MemoryStorage, Product};
    use rust_decimal::Decimal;

    use super::*;

    #[tokio::test]
    async fn test_cart_view_formats_lines_and_total() {
        let mut cart = CartStore::restore(Arc::new(MemoryStorage::new()), CART_NAMESPACE).await;
        let product = Product {
            id: ProductId::new(4),
            name: "Caneca".to_string(),
            category: "Casa".to_string(),
            price: Decimal::new(2550, 2),
            image: "caneca.jpg".to_string(),
        };
        cart.add(&product).await;
        cart.add(&product).await;

        let view = CartView::from(&cart);

        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].quantity, 2);
        assert_eq!(view.items[0].line_price, "R$ 51.00");
        assert_eq!(view.total, "R$ 51.00");
        assert_eq!(view.item_count, 2);
    }

    #[test]
    fn test_cart_product_form_rejects_garbage() {
        let form = CartProductForm {
            product_id: "abc".to_string(),
        };
        assert!(matches!(form.product_id(), Err(AppError::BadRequest(_))));
    }
}
