//! # Catalog Repository
//!
//! Product CRUD over `products.csv`.
//!
//! ## Key Operations
//! - Full snapshot load and save
//! - Add / update / remove with input validation
//! - Paged listing
//!
//! Every mutation is one load-mutate-save cycle under the writer lock.

use tracing::{debug, info};

use stockroom_core::catalog::PRODUCT_IDS;
use stockroom_core::{
    catalog, IdWatermark, NewProduct, OrderLine, Page, Product, ProductUpdate,
};

use crate::error::StoreResult;
use crate::store::Store;

/// Repository for catalog operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = store.catalog();
///
/// let pen = repo.add(NewProduct::new("Pen", "1.50".parse()?, 40)).await?;
/// let page = repo.list_page(1, 10).await?;
/// ```
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    store: Store,
}

impl CatalogRepository {
    pub fn new(store: Store) -> Self {
        CatalogRepository { store }
    }

    /// Every product, in file order.
    pub async fn list(&self) -> StoreResult<Vec<Product>> {
        let tx = self.store.begin().await;
        let products: Vec<Product> = tx.load().await?;
        debug!(count = products.len(), "Loaded catalog");
        Ok(products)
    }

    /// Replaces the whole catalog snapshot.
    pub async fn save(&self, products: &[Product]) -> StoreResult<()> {
        let mut tx = self.store.begin().await;
        tx.stage(products)?;
        tx.commit().await?;
        info!(count = products.len(), "Catalog saved");
        Ok(())
    }

    /// One page of the catalog.
    ///
    /// ## Arguments
    /// * `page` - 1-based; 0 is treated as 1
    /// * `limit` - page size; 0 uses the configured default
    pub async fn list_page(&self, page: usize, limit: usize) -> StoreResult<Page<Product>> {
        let limit = if limit == 0 {
            self.store.config().reports.page_size
        } else {
            limit
        };

        let products = self.list().await?;
        Ok(catalog::paginate(&products, page, limit))
    }

    /// Looks up a product. Not-found is `None`, not an error.
    pub async fn get(&self, id: u64) -> StoreResult<Option<Product>> {
        let tx = self.store.begin().await;
        let products: Vec<Product> = tx.load().await?;
        Ok(catalog::find(&products, id).cloned())
    }

    pub async fn count(&self) -> StoreResult<usize> {
        Ok(self.list().await?.len())
    }

    /// Validates and appends a product with the next free id.
    ///
    /// Removed ids and ids still referenced by order lines are skipped, so
    /// cancelling an old order can never restock a different product.
    pub async fn add(&self, draft: NewProduct) -> StoreResult<Product> {
        let mut tx = self.store.begin().await;
        let mut products: Vec<Product> = tx.load().await?;
        let lines: Vec<OrderLine> = tx.load().await?;
        let watermarks: Vec<IdWatermark> = tx.load().await?;

        let retired = lines
            .iter()
            .map(|l| l.product_id)
            .chain([catalog::highest_removed(&watermarks, PRODUCT_IDS)]);
        let product = catalog::create(&mut products, draft, retired)?;

        tx.stage(&products)?;
        tx.commit().await?;

        info!(id = product.id, name = %product.name, price = %product.price, "Product added");
        Ok(product)
    }

    /// Applies the set fields of `update`. Unknown id is `ProductNotFound`.
    pub async fn update(&self, id: u64, update: ProductUpdate) -> StoreResult<Product> {
        let mut tx = self.store.begin().await;
        let mut products: Vec<Product> = tx.load().await?;

        let product = catalog::update(&mut products, id, update)?;

        tx.stage(&products)?;
        tx.commit().await?;

        info!(id, quantity = product.quantity, price = %product.price, "Product updated");
        Ok(product)
    }

    /// Deletes a product. Order lines that reference it are kept and its id
    /// is retired.
    pub async fn remove(&self, id: u64) -> StoreResult<Product> {
        let mut tx = self.store.begin().await;
        let mut products: Vec<Product> = tx.load().await?;
        let mut watermarks: Vec<IdWatermark> = tx.load().await?;

        let product = catalog::remove(&mut products, id)?;
        catalog::retire_id(&mut watermarks, PRODUCT_IDS, id);

        tx.stage(&products)?;
        tx.stage(&watermarks)?;
        tx.commit().await?;

        info!(id, name = %product.name, "Product removed");
        Ok(product)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::error::StoreError;
    use stockroom_core::{CoreError, ErrorKind, Money};

    async fn repo(dir: &std::path::Path) -> CatalogRepository {
        Store::open_with(StoreConfig::with_data_dir(dir), None)
            .await
            .unwrap()
            .catalog()
    }

    fn draft(name: &str, cents: i64, quantity: u32) -> NewProduct {
        NewProduct::new(name, Money::from_cents(cents), quantity)
    }

    #[tokio::test]
    async fn test_add_assigns_increasing_ids() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo(dir.path()).await;

        let a = repo.add(draft("Pen", 150, 10)).await.unwrap();
        let b = repo.add(draft("Ink", 300, 5)).await.unwrap();
        repo.remove(b.id).await.unwrap();
        let c = repo.add(draft("Pad", 200, 1)).await.unwrap();

        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        // The removed id stays retired
        assert_eq!(c.id, 3);
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_removed_ids_stay_retired_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let repo = repo(dir.path()).await;
            for name in ["Pen", "Ink", "Pad"] {
                repo.add(draft(name, 100, 1)).await.unwrap();
            }
            repo.remove(3).await.unwrap();
            repo.remove(1).await.unwrap();
        }

        let repo = repo(dir.path()).await;
        let next = repo.add(draft("Lamp", 100, 1)).await.unwrap();
        assert_eq!(next.id, 4);
    }

    #[tokio::test]
    async fn test_add_rejects_invalid_product() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo(dir.path()).await;

        let err = repo.add(draft("", 100, 1)).await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::ValidationFailure));
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_keeps_unset_fields() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo(dir.path()).await;
        let pen = repo
            .add(draft("Pen", 150, 10).description("blue"))
            .await
            .unwrap();

        let updated = repo
            .update(pen.id, ProductUpdate::default().quantity(3))
            .await
            .unwrap();

        assert_eq!(updated.quantity, 3);
        assert_eq!(updated.name, "Pen");
        assert_eq!(updated.description, "blue");
        assert_eq!(repo.get(pen.id).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn test_unknown_id() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo(dir.path()).await;

        assert_eq!(repo.get(9).await.unwrap(), None);
        assert!(matches!(
            repo.update(9, ProductUpdate::default().quantity(1)).await,
            Err(StoreError::Domain(CoreError::ProductNotFound(9)))
        ));
        assert!(matches!(
            repo.remove(9).await,
            Err(StoreError::Domain(CoreError::ProductNotFound(9)))
        ));
    }

    #[tokio::test]
    async fn test_list_page() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo(dir.path()).await;
        for i in 0..12 {
            repo.add(draft(&format!("P{i}"), 100, 1)).await.unwrap();
        }

        let first = repo.list_page(1, 0).await.unwrap();
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.total, 12);
        assert_eq!(first.pages, 2);

        let second = repo.list_page(2, 5).await.unwrap();
        assert_eq!(second.items[0].id, 6);
        assert_eq!(second.pages, 3);
    }

    #[tokio::test]
    async fn test_save_overwrites_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let repo = repo(dir.path()).await;
        repo.add(draft("Pen", 150, 10)).await.unwrap();

        let replacement = vec![Product {
            id: 5,
            name: "Lamp".into(),
            description: "desk, white".into(),
            price: Money::from_cents(2500),
            quantity: 2,
        }];
        repo.save(&replacement).await.unwrap();

        assert_eq!(repo.list().await.unwrap(), replacement);
    }
}
