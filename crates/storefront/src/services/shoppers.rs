//! Per-visitor storefront state.
//!
//! Every visitor is identified by a cart token kept in their session. The
//! registry restores the visitor's cart from storage on first touch and
//! keeps it in memory while they are active.
//!
//! The cache may evict a shopper that a request still holds, for example
//! one waiting on payment. A weak side index keeps such a shopper reachable,
//! so the next request for the token gets the same instance back instead of
//! a second cart restored from storage. Only shoppers nobody holds are
//! restored afresh.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, Weak};
use std::time::Duration;

use ecotrend_core::{CART_NAMESPACE, CartStorage, CartStore, CheckoutFlow, CheckoutForm};
use moka::future::Cache;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Idle time before an in-memory shopper is dropped.
const SHOPPER_IDLE_TTL: Duration = Duration::from_secs(30 * 60);

/// Upper bound on shoppers held in memory.
const MAX_SHOPPERS: u64 = 10_000;

/// Storage key for a visitor's cart.
#[must_use]
pub fn cart_key(token: Uuid) -> String {
    format!("{CART_NAMESPACE}:{token}")
}

/// One visitor's cart, checkout form, and checkout progress.
#[derive(Debug)]
pub struct Shopper {
    pub cart: CartStore,
    pub form: CheckoutForm,
    pub checkout: CheckoutFlow,
}

impl Shopper {
    /// Restore the cart persisted under `key`, with a blank form.
    pub async fn restore(storage: Arc<dyn CartStorage>, key: String) -> Self {
        Self {
            cart: CartStore::restore(storage, key).await,
            form: CheckoutForm::default(),
            checkout: CheckoutFlow::new(),
        }
    }
}

/// Shared handle to a shopper. All mutations go through the mutex.
pub type SharedShopper = Arc<Mutex<Shopper>>;

type LiveShoppers = Arc<std::sync::Mutex<HashMap<Uuid, Weak<Mutex<Shopper>>>>>;

/// In-memory index of active shoppers.
#[derive(Clone)]
pub struct ShopperRegistry {
    storage: Arc<dyn CartStorage>,
    shoppers: Cache<Uuid, SharedShopper>,
    live: LiveShoppers,
}

impl ShopperRegistry {
    #[must_use]
    pub fn new(storage: Arc<dyn CartStorage>) -> Self {
        let shoppers = Cache::builder()
            .max_capacity(MAX_SHOPPERS)
            .time_to_idle(SHOPPER_IDLE_TTL)
            .build();

        Self {
            storage,
            shoppers,
            live: LiveShoppers::default(),
        }
    }

    /// The shopper for `token`, restoring their cart if nobody holds it.
    pub async fn get(&self, token: Uuid) -> SharedShopper {
        let storage = Arc::clone(&self.storage);
        let live = Arc::clone(&self.live);
        self.shoppers
            .get_with(token, async move {
                let held = live
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .get(&token)
                    .and_then(Weak::upgrade);
                if let Some(shopper) = held {
                    tracing::debug!(%token, "Re-admitting held shopper");
                    return shopper;
                }

                tracing::debug!(%token, "Restoring shopper");
                let shopper = Arc::new(Mutex::new(
                    Shopper::restore(storage, cart_key(token)).await,
                ));

                let mut live = live.lock().unwrap_or_else(PoisonError::into_inner);
                live.retain(|_, entry| entry.strong_count() > 0);
                live.insert(token, Arc::downgrade(&shopper));
                shopper
            })
            .await
    }
}
