//! Product catalog loaded once at startup.
//!
//! The catalog starts out [`CatalogState::Loading`] and moves to
//! [`CatalogState::Ready`] exactly once. A failed fetch is logged and yields
//! an empty catalog; shoppers see an empty grid, not an error.

use std::sync::Arc;

use ecotrend_core::{Product, ProductId};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::instrument;

use crate::config::CatalogSource;

/// Errors fetching or decoding the product feed.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Catalog source returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Loading progress of the catalog.
#[derive(Debug, Clone)]
pub enum CatalogState {
    Loading,
    Ready(Arc<[Product]>),
}

/// Shared handle to the catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    state: Arc<RwLock<CatalogState>>,
}

impl Catalog {
    /// A catalog that has not been loaded yet.
    #[must_use]
    pub fn loading() -> Self {
        Self {
            state: Arc::new(RwLock::new(CatalogState::Loading)),
        }
    }

    /// A catalog that is already loaded.
    #[must_use]
    pub fn ready(products: Vec<Product>) -> Self {
        Self {
            state: Arc::new(RwLock::new(CatalogState::Ready(products.into()))),
        }
    }

    /// Current state. Cheap: the product list is shared.
    pub async fn snapshot(&self) -> CatalogState {
        self.state.read().await.clone()
    }

    pub async fn is_loading(&self) -> bool {
        matches!(*self.state.read().await, CatalogState::Loading)
    }

    /// Loaded products, or an empty list while loading.
    pub async fn products(&self) -> Arc<[Product]> {
        match &*self.state.read().await {
            CatalogState::Loading => Arc::from(Vec::new()),
            CatalogState::Ready(products) => Arc::clone(products),
        }
    }

    /// Look up a product by ID.
    pub async fn find(&self, id: ProductId) -> Option<Product> {
        match &*self.state.read().await {
            CatalogState::Loading => None,
            CatalogState::Ready(products) => products.iter().find(|p| p.id == id).cloned(),
        }
    }

    /// Fetch `source` once and publish the result.
    ///
    /// Never fails: errors are logged and leave the catalog empty. There is
    /// no retry.
    #[instrument(skip(self, client, source), fields(source = %source))]
    pub async fn load(&self, client: &reqwest::Client, source: &CatalogSource) {
        let products = match fetch(client, source).await {
            Ok(products) => {
                tracing::info!(count = products.len(), "Catalog loaded");
                products
            }
            Err(e) => {
                tracing::warn!(error = %e, "Catalog fetch failed, serving empty catalog");
                Vec::new()
            }
        };

        self.publish(products).await;
    }

    /// Replace the catalog contents and mark it ready.
    pub async fn publish(&self, products: Vec<Product>) {
        *self.state.write().await = CatalogState::Ready(products.into());
    }

    /// Start [`Self::load`] on a background task.
    pub fn spawn_load(
        &self,
        client: reqwest::Client,
        source: CatalogSource,
    ) -> tokio::task::JoinHandle<()> {
        let catalog = self.clone();
        tokio::spawn(async move { catalog.load(&client, &source).await })
    }
}

/// Read and decode the product feed.
///
/// # Errors
///
/// Returns `CatalogError` if the source cannot be read or is not a JSON
/// array of products.
pub async fn fetch(
    client: &reqwest::Client,
    source: &CatalogSource,
) -> Result<Vec<Product>, CatalogError> {
    let body = match source {
        CatalogSource::Http(url) => {
            let response = client.get(url.clone()).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(CatalogError::Status(status));
            }
            response.text().await?
        }
        CatalogSource::File(path) => tokio::fs::read_to_string(path).await?,
    };

    Ok(serde_json::from_str(&body)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use rust_decimal::Decimal;

    use super::*;

    const FEED: &str = r#"[
        {"id": 1, "name": "Garrafa", "category": "Casa", "price": 100, "image": "a.jpg"},
        {"id": 2, "name": "Sabonete", "category": "Beleza", "price": 50.5, "image": "b.jpg"}
    ]"#;

    fn feed_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_starts_loading() {
        let catalog = Catalog::loading();
        assert!(catalog.is_loading().await);
        assert!(catalog.products().await.is_empty());
        assert!(catalog.find(ProductId::new(1)).await.is_none());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let file = feed_file(FEED);
        let catalog = Catalog::loading();

        catalog
            .load(
                &reqwest::Client::new(),
                &CatalogSource::File(file.path().to_path_buf()),
            )
            .await;

        assert!(!catalog.is_loading().await);
        let products = catalog.products().await;
        assert_eq!(products.len(), 2);
        assert_eq!(products[1].price, Decimal::new(505, 1));
        assert_eq!(
            catalog.find(ProductId::new(2)).await.unwrap().name,
            "Sabonete"
        );
    }

    #[tokio::test]
    async fn test_missing_file_yields_empty_ready_catalog() {
        let catalog = Catalog::loading();

        catalog
            .load(
                &reqwest::Client::new(),
                &CatalogSource::File("/definitely/not/here.json".into()),
            )
            .await;

        assert!(!catalog.is_loading().await);
        assert!(catalog.products().await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_feed_yields_empty_ready_catalog() {
        let file = feed_file(r#"{"products": []}"#);
        let catalog = Catalog::loading();

        catalog
            .load(
                &reqwest::Client::new(),
                &CatalogSource::File(file.path().to_path_buf()),
            )
            .await;

        assert!(matches!(catalog.snapshot().await, CatalogState::Ready(ref p) if p.is_empty()));
    }

    #[tokio::test]
    async fn test_fetch_reports_parse_errors() {
        let file = feed_file("not json");
        let err = fetch(
            &reqwest::Client::new(),
            &CatalogSource::File(file.path().to_path_buf()),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[tokio::test]
    async fn test_spawn_load_completes() {
        let file = feed_file(FEED);
        let catalog = Catalog::loading();

        catalog
            .spawn_load(
                reqwest::Client::new(),
                CatalogSource::File(file.path().to_path_buf()),
            )
            .await
            .unwrap();

        assert_eq!(catalog.products().await.len(), 2);
    }
}
