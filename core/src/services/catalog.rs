// core/src/services/catalog.rs

use crate::error::{MarketError, Result};
use crate::models::{NewProduct, Product, ProductPatch, ProductStatus};
use crate::pagination::{Page, PageRequest};
use crate::policy::{ListingPolicy, Role};
use crate::store::MarketStore;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Listing parameters as requested by the caller, before policy is applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductQuery {
  pub status: Option<ProductStatus>,
  pub page: PageRequest,
}

pub struct CatalogService {
  store: Arc<dyn MarketStore>,
  policy: ListingPolicy,
}

impl CatalogService {
  pub fn new(store: Arc<dyn MarketStore>, policy: ListingPolicy) -> Self {
    Self { store, policy }
  }

  #[instrument(name = "catalog::list_products", skip(self))]
  pub async fn list_products(&self, query: ProductQuery, role: Role) -> Result<Page<Product>> {
    let status = self.policy.effective_status(query.status, role);
    let (items, total) = self.store.list_products(status, query.page).await?;
    Ok(Page::new(items, total, query.page))
  }

  pub async fn get_product(&self, id: i64) -> Result<Product> {
    self
      .store
      .find_product(id)
      .await?
      .ok_or_else(|| MarketError::not_found("product", id))
  }

  #[instrument(name = "catalog::create_product", skip(self, new), fields(name = %new.name))]
  pub async fn create_product(&self, new: NewProduct) -> Result<Product> {
    new.validate()?;
    let product = self.store.insert_product(&new).await?;
    info!(product_id = product.id, "Product created.");
    Ok(product)
  }

  #[instrument(name = "catalog::update_product", skip(self, patch))]
  pub async fn update_product(&self, id: i64, patch: ProductPatch) -> Result<Product> {
    patch.validate()?;
    match self.store.update_product(id, &patch).await? {
      Some(product) => Ok(product),
      None => {
        warn!("Update requested for unknown product.");
        Err(MarketError::not_found("product", id))
      }
    }
  }

  /// Soft delete: the product turns inactive but stays fetchable by id.
  #[instrument(name = "catalog::delete_product", skip(self))]
  pub async fn delete_product(&self, id: i64) -> Result<()> {
    if !self.store.set_product_status(id, ProductStatus::Inactive).await? {
      return Err(MarketError::not_found("product", id));
    }
    info!("Product deactivated.");
    Ok(())
  }
}
