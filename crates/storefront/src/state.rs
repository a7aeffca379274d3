//! Application state shared across handlers.

use std::sync::Arc;

use ecotrend_core::CartStorage;

use crate::config::StorefrontConfig;
use crate::services::{Catalog, FileStorage, ShopperRegistry, SimulatedGateway};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the catalog and the shopper registry.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: Catalog,
    shoppers: ShopperRegistry,
    gateway: SimulatedGateway,
    http: reqwest::Client,
}

impl AppState {
    /// Create application state with file-backed cart storage.
    ///
    /// The catalog starts out loading; call [`Self::start_catalog_load`].
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let storage = Arc::new(FileStorage::new(config.data_dir.clone()));
        Self::with_parts(config, Catalog::loading(), storage)
    }

    /// Create application state from explicit parts.
    #[must_use]
    pub fn with_parts(
        config: StorefrontConfig,
        catalog: Catalog,
        storage: Arc<dyn CartStorage>,
    ) -> Self {
        let gateway = SimulatedGateway::new(config.checkout_delay);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                shoppers: ShopperRegistry::new(storage),
                gateway,
                http: reqwest::Client::new(),
            }),
        }
    }

    /// Start loading the catalog in the background.
    pub fn start_catalog_load(&self) -> tokio::task::JoinHandle<()> {
        self.inner.catalog.spawn_load(
            self.inner.http.clone(),
            self.inner.config.catalog_source.clone(),
        )
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    #[must_use]
    pub fn shoppers(&self) -> &ShopperRegistry {
        &self.inner.shoppers
    }

    #[must_use]
    pub fn gateway(&self) -> &SimulatedGateway {
        &self.inner.gateway
    }
}
