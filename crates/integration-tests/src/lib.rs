//! Integration tests for the EcoTrend storefront.
//!
//! Tests drive the full router in-process with [`tower::ServiceExt::oneshot`],
//! carrying the session cookie between requests the way a browser would.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p ecotrend-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `storefront_catalog` - Product grid, filters, detail overlay, readiness
//! - `storefront_cart` - Cart add/remove, count badge, per-visitor isolation
//! - `storefront_checkout` - Validation, installments, simulated payment

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
};
use ecotrend_core::{Product, ProductId};
use ecotrend_storefront::{
    app,
    config::StorefrontConfig,
    services::{Catalog, FileStorage},
    state::AppState,
};
use rust_decimal::Decimal;
use tempfile::TempDir;
use tower::ServiceExt;

/// Payment delay used by tests that do not care about timing.
pub const FAST_CHECKOUT: Duration = Duration::from_millis(20);

/// A storefront under test, with its own cart directory and session cookie.
///
/// Cloning after the first request yields a second handle for the same
/// visitor, for driving concurrent requests.
#[derive(Clone)]
pub struct TestApp {
    router: Router,
    cookie: Option<String>,
    _data_dir: Arc<TempDir>,
}

/// A buffered response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// The `HX-Trigger` header, if any.
    #[must_use]
    pub fn hx_trigger(&self) -> Option<&str> {
        self.headers.get("HX-Trigger").and_then(|v| v.to_str().ok())
    }
}

impl TestApp {
    /// A storefront with a loaded catalog.
    #[must_use]
    pub fn new(products: Vec<Product>) -> Self {
        Self::with_catalog(Catalog::ready(products), FAST_CHECKOUT)
    }

    /// A storefront with an explicit catalog state and payment delay.
    #[must_use]
    pub fn with_catalog(catalog: Catalog, checkout_delay: Duration) -> Self {
        let data_dir = tempfile::tempdir().expect("Failed to create temp dir");

        let config = StorefrontConfig {
            data_dir: data_dir.path().to_path_buf(),
            checkout_delay,
            ..StorefrontConfig::default()
        };
        let storage = Arc::new(FileStorage::new(data_dir.path()));
        let state = AppState::with_parts(config, catalog, storage);

        Self {
            router: app(state),
            cookie: None,
            _data_dir: Arc::new(data_dir),
        }
    }

    /// A fresh visitor on the same storefront (no session cookie).
    #[must_use]
    pub fn new_visitor(&self) -> Self {
        Self {
            cookie: None,
            ..self.clone()
        }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        let request = self.request("GET", uri).body(Body::empty());
        self.send(request.expect("Failed to build request")).await
    }

    pub async fn post_form(&mut self, uri: &str, body: &str) -> TestResponse {
        let request = self
            .request("POST", uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()));
        self.send(request.expect("Failed to build request")).await
    }

    fn request(&self, method: &str, uri: &str) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(uri);
        match &self.cookie {
            Some(cookie) => builder.header(header::COOKIE, cookie),
            None => builder,
        }
    }

    async fn send(&mut self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .unwrap_or_else(|e| match e {});

        if let Some(cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
        {
            self.cookie = Some(cookie.to_string());
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");

        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}

/// Build a catalog product.
#[must_use]
pub fn product(id: i32, name: &str, category: &str, price: i64) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        category: category.to_string(),
        price: Decimal::new(price, 0),
        image: format!("/static/images/{id}.svg"),
    }
}

/// A small catalog spanning two categories.
#[must_use]
pub fn sample_catalog() -> Vec<Product> {
    vec![
        product(1, "Garrafa Reutilizável", "Casa", 150),
        product(2, "Ecobag", "Moda", 50),
        product(3, "Composteira", "Casa", 300),
        product(4, "Camiseta Orgânica", "Moda", 100),
    ]
}
