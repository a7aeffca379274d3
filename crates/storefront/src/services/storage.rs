//! File-backed cart storage.
//!
//! Each key maps to one JSON file under the data directory. Writes go to a
//! temporary sibling first and are renamed into place, so a crash mid-write
//! leaves the previous value intact. All file access goes through
//! `tokio::fs`, which keeps it off the async worker threads.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use ecotrend_core::{CartStorage, StorageError};
use tokio::fs;

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create a store rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ':'));
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }

        // ':' is not portable in file names
        let file_name = format!("{}.json", key.replace(':', "__"));
        Ok(self.dir.join(file_name))
    }
}

#[async_trait]
impl CartStorage for FileStorage {
    async fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir).await?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use ecotrend_core::{CartStore, Product, ProductId};
    use rust_decimal::Decimal;

    use super::*;

    #[tokio::test]
    async fn test_missing_key_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        assert!(storage.load("eco_cart").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested"));

        storage.save("eco_cart:abc-123", "[]").await.unwrap();
        storage.save("eco_cart:abc-123", "[1]").await.unwrap();

        assert_eq!(
            storage.load("eco_cart:abc-123").await.unwrap().as_deref(),
            Some("[1]")
        );
        assert!(dir.path().join("nested/eco_cart__abc-123.json").exists());
        assert!(!dir.path().join("nested/eco_cart__abc-123.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_keys_do_not_escape_directory() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        for key in ["../etc/passwd", "a/b", "", "eco cart"] {
            assert!(matches!(
                storage.save(key, "x").await,
                Err(StorageError::InvalidKey(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_cart_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let product = Product {
            id: ProductId::new(5),
            name: "Ecobag".to_string(),
            category: "Moda".to_string(),
            price: Decimal::new(4900, 2),
            image: String::new(),
        };

        {
            let storage = Arc::new(FileStorage::new(dir.path()));
            let mut cart = CartStore::restore(storage, "eco_cart:visitor").await;
            cart.add(&product).await;
            cart.add(&product).await;
        }

        let storage = Arc::new(FileStorage::new(dir.path()));
        let cart = CartStore::restore(storage, "eco_cart:visitor").await;
        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.total(), Decimal::new(98, 0));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_writes_yield_to_other_tasks() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        let ticker = tokio::spawn(async {});
        storage.save("eco_cart:yield", "[]").await.unwrap();

        // The spawned task only runs if the save suspended the current one
        assert!(ticker.is_finished());
    }
}
