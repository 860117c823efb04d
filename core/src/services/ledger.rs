// core/src/services/ledger.rs

use crate::error::Result;
use crate::models::TransactionDetails;
use crate::pagination::{Page, PageRequest};
use crate::store::MarketStore;
use std::sync::Arc;

/// Read-only view over the marketplace ledger for administrators.
pub struct LedgerService {
  store: Arc<dyn MarketStore>,
}

impl LedgerService {
  pub fn new(store: Arc<dyn MarketStore>) -> Self {
    Self { store }
  }

  pub async fn list_transactions(&self, page: PageRequest) -> Result<Page<TransactionDetails>> {
    let (items, total) = self.store.list_transactions(page).await?;
    Ok(Page::new(items, total, page))
  }
}
