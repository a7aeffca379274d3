//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use ecotrend_core::filter_products;
use tracing::instrument;

use crate::filters;
use crate::middleware::Visitor;
use crate::routes::cart::CartView;
use crate::routes::checkout::CheckoutView;
use crate::routes::products::{FilterQuery, FilterView, ProductView};
use crate::state::AppState;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    /// Category and price controls.
    pub controls: FilterView,
    /// Whether the catalog is still being fetched.
    pub loading: bool,
    /// Products passing the current filters.
    pub products: Vec<ProductView>,
    pub cart: CartView,
    pub checkout: CheckoutView,
}

/// Display the home page: filters, product grid, and cart sidebar.
///
/// Filter values from the query string are honored so a filtered view can
/// be bookmarked.
#[instrument(skip(state, shopper))]
pub async fn home(
    State(state): State<AppState>,
    Visitor(shopper): Visitor,
    Query(query): Query<FilterQuery>,
) -> impl IntoResponse {
    let loading = state.catalog().is_loading().await;
    let catalog = state.catalog().products().await;
    let criteria = query.criteria();

    let products = filter_products(&catalog, &criteria)
        .into_iter()
        .map(ProductView::from)
        .collect();

    let shopper = shopper.lock().await;

    HomeTemplate {
        controls: FilterView::new(&catalog, &criteria),
        loading,
        products,
        cart: CartView::from(&shopper.cart),
        checkout: CheckoutView::from_shopper(&shopper),
    }
}
