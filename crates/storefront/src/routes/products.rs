//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use ecotrend_core::{
    CategoryFilter, FilterCriteria, Product, ProductId, category_options, filter_products,
    filter::ALL_CATEGORIES,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: i32,
    pub name: String,
    pub category: String,
    pub price: String,
    pub image: String,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.as_i32(),
            name: product.name.clone(),
            category: product.category.clone(),
            price: product.display_price().to_string(),
            image: product.image.clone(),
        }
    }
}

/// One entry in the category selector.
#[derive(Clone)]
pub struct CategoryOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Filter controls display data.
#[derive(Clone)]
pub struct FilterView {
    pub categories: Vec<CategoryOption>,
    pub max_price: String,
    pub price_limit: String,
}

impl FilterView {
    /// Build the controls for `criteria` over the loaded `catalog`.
    #[must_use]
    pub fn new(catalog: &[Product], criteria: &FilterCriteria) -> Self {
        let all = CategoryOption {
            value: ALL_CATEGORIES.to_string(),
            label: "All".to_string(),
            selected: criteria.category == CategoryFilter::All,
        };

        let categories = std::iter::once(all)
            .chain(category_options(catalog).into_iter().map(|c| CategoryOption {
                value: c.to_string(),
                label: c.to_string(),
                selected: criteria.category.matches(c) && criteria.category != CategoryFilter::All,
            }))
            .collect();

        Self {
            categories,
            max_price: criteria.max_price().trunc().to_string(),
            price_limit: FilterCriteria::MAX_PRICE.to_string(),
        }
    }
}

/// Filter query parameters.
///
/// Both fields are lenient: a missing or unparseable price falls back to
/// the upper bound.
#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    pub category: Option<String>,
    pub max_price: Option<String>,
}

impl FilterQuery {
    #[must_use]
    pub fn criteria(&self) -> FilterCriteria {
        let category = CategoryFilter::from(self.category.clone().unwrap_or_default());
        let max_price = self
            .max_price
            .as_deref()
            .and_then(|raw| raw.trim().parse::<Decimal>().ok())
            .unwrap_or(FilterCriteria::MAX_PRICE);
        FilterCriteria::new(category, max_price)
    }
}

/// Product grid fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/product_grid.html")]
pub struct ProductGridTemplate {
    pub loading: bool,
    pub products: Vec<ProductView>,
}

/// Product detail overlay fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/product_detail.html")]
pub struct ProductDetailTemplate {
    pub product: ProductView,
}

/// Filtered product grid (HTMX).
#[instrument(skip(state))]
pub async fn grid(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> impl IntoResponse {
    let loading = state.catalog().is_loading().await;
    let catalog = state.catalog().products().await;
    let criteria = query.criteria();

    ProductGridTemplate {
        loading,
        products: filter_products(&catalog, &criteria)
            .into_iter()
            .map(ProductView::from)
            .collect(),
    }
}

/// Product detail overlay (HTMX).
#[instrument(skip(state))]
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let product_id = id
        .parse::<ProductId>()
        .map_err(|_| AppError::NotFound(format!("product {id}")))?;

    let product = state
        .catalog()
        .find(product_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;

    Ok(ProductDetailTemplate {
        product: ProductView::from(&product),
    })
}
