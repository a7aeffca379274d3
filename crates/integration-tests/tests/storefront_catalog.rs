//! Integration tests for the product grid, filters, and readiness.

use axum::http::StatusCode;
use ecotrend_integration_tests::{FAST_CHECKOUT, TestApp, sample_catalog};
use ecotrend_storefront::services::Catalog;

// =============================================================================
// Home Page
// =============================================================================

#[tokio::test]
async fn test_home_lists_catalog_and_categories() {
    let mut app = TestApp::new(sample_catalog());

    let resp = app.get("/").await;

    assert_eq!(resp.status, StatusCode::OK);
    for name in ["Garrafa Reutilizável", "Ecobag", "Composteira", "Camiseta Orgânica"] {
        assert!(resp.body.contains(name), "missing {name}");
    }
    assert!(resp.body.contains(r#"<option value="all" selected>All</option>"#));
    assert!(resp.body.contains(r#"<option value="Casa">Casa</option>"#));
    assert!(resp.body.contains(r#"<option value="Moda">Moda</option>"#));
    assert!(resp.body.contains("Your cart is empty."));
}

#[tokio::test]
async fn test_home_honors_filter_query() {
    let mut app = TestApp::new(sample_catalog());

    let resp = app.get("/?category=Moda&max_price=5000").await;

    assert!(resp.body.contains("Ecobag"));
    assert!(!resp.body.contains("Composteira"));
    assert!(resp.body.contains(r#"<option value="Moda" selected>Moda</option>"#));
}

// =============================================================================
// Product Grid
// =============================================================================

#[tokio::test]
async fn test_grid_all_categories_preserves_catalog_order() {
    let mut app = TestApp::new(sample_catalog());

    let resp = app.get("/products?category=all&max_price=5000").await;

    assert_eq!(resp.status, StatusCode::OK);
    let positions: Vec<usize> = ["Garrafa Reutilizável", "Ecobag", "Composteira", "Camiseta Orgânica"]
        .iter()
        .map(|name| resp.body.find(name).expect("product rendered"))
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn test_grid_filters_by_category_and_price() {
    let mut app = TestApp::new(sample_catalog());

    let resp = app.get("/products?category=Casa&max_price=200").await;

    assert!(resp.body.contains("Garrafa Reutilizável"));
    assert!(!resp.body.contains("Composteira"));
    assert!(!resp.body.contains("Ecobag"));
}

#[tokio::test]
async fn test_grid_price_threshold_is_inclusive() {
    let mut app = TestApp::new(sample_catalog());

    let resp = app.get("/products?max_price=150").await;

    assert!(resp.body.contains("Garrafa Reutilizável"));
    assert!(resp.body.contains("Camiseta Orgânica"));
    assert!(!resp.body.contains("Composteira"));
}

#[tokio::test]
async fn test_grid_without_matches_shows_notice() {
    let mut app = TestApp::new(sample_catalog());

    let resp = app.get("/products?category=Casa&max_price=10").await;

    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("No products match your filters."));
}

#[tokio::test]
async fn test_grid_unknown_category_matches_nothing() {
    let mut app = TestApp::new(sample_catalog());

    let resp = app.get("/products?category=Jardim").await;

    assert!(resp.body.contains("No products match your filters."));
}

// =============================================================================
// Product Detail
// =============================================================================

#[tokio::test]
async fn test_detail_renders_product() {
    let mut app = TestApp::new(sample_catalog());

    let resp = app.get("/products/3").await;

    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("Composteira"));
    assert!(resp.body.contains("R$ 300.00"));
}

#[tokio::test]
async fn test_detail_unknown_product_is_not_found() {
    let mut app = TestApp::new(sample_catalog());

    assert_eq!(app.get("/products/99").await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.get("/products/abc").await.status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Loading and Health
// =============================================================================

#[tokio::test]
async fn test_loading_catalog_reports_not_ready() {
    let mut app = TestApp::with_catalog(Catalog::loading(), FAST_CHECKOUT);

    assert_eq!(app.get("/health").await.status, StatusCode::OK);
    assert_eq!(
        app.get("/health/ready").await.status,
        StatusCode::SERVICE_UNAVAILABLE
    );

    let resp = app.get("/products").await;
    assert!(resp.body.contains("Loading products..."));
}

#[tokio::test]
async fn test_loading_grid_refreshes_until_catalog_arrives() {
    let catalog = Catalog::loading();
    let mut app = TestApp::with_catalog(catalog.clone(), FAST_CHECKOUT);

    let home = app.get("/").await;
    assert!(home.body.contains("Loading products..."));
    assert!(home.body.contains(r#"hx-trigger="load delay:500ms""#));
    assert!(home.body.contains(r#"hx-include=".filters""#));

    catalog.publish(sample_catalog()).await;

    let grid = app.get("/products?category=Casa").await;
    assert!(grid.body.contains("Garrafa Reutilizável"));
    assert!(!grid.body.contains("Ecobag"));
    assert!(!grid.body.contains("Loading products..."));
    assert!(!grid.body.contains("load delay:500ms"));
    assert_eq!(app.get("/health/ready").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_loaded_catalog_reports_ready() {
    let mut app = TestApp::new(sample_catalog());

    let resp = app.get("/health/ready").await;

    assert_eq!(resp.status, StatusCode::OK);
}

#[tokio::test]
async fn test_empty_catalog_is_ready_and_empty() {
    let mut app = TestApp::new(Vec::new());

    assert_eq!(app.get("/health/ready").await.status, StatusCode::OK);
    let resp = app.get("/").await;
    assert!(resp.body.contains("No products match your filters."));
    assert!(resp.body.contains(r#"<option value="all" selected>All</option>"#));
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let mut app = TestApp::new(sample_catalog());

    let resp = app.get("/health").await;

    assert!(resp.headers.contains_key("x-request-id"));
}
