// core/src/lib.rs

//! Walletpoint marketplace core.
//!
//! Students spend wallet points on products sold by administrators. This
//! crate holds the domain: the product catalog, per-user carts, point
//! purchases that debit a wallet and decrement stock atomically, the
//! purchase ledger and the audit trail port.
//!
//! Storage sits behind [`MarketStore`] with a PostgreSQL adapter
//! ([`PgMarketStore`]) and an in-memory one ([`InMemoryMarketStore`]).
//! Purchases run as a step [`Pipeline`] over one storage transaction.

pub mod audit;
pub mod error;
pub mod models;
pub mod pagination;
pub mod pipeline;
pub mod policy;
pub mod services;
pub mod store;

pub use crate::audit::{AuditAction, AuditEntity, AuditEntry, AuditSink, MemoryAuditSink, PgAuditSink};
pub use crate::error::{MarketError, PipelineError, Result};
pub use crate::pagination::{Page, PageRequest};
pub use crate::pipeline::{ContextData, Pipeline, PipelineControl, PipelineResult};
pub use crate::policy::{ListingPolicy, Role};
pub use crate::services::{CartService, CatalogService, CheckoutReceipt, CheckoutService, LedgerService, ProductQuery};
pub use crate::store::{InMemoryMarketStore, MarketStore, PgMarketStore, PurchaseTx};

use std::sync::Arc;

/// Every marketplace service wired to one store.
pub struct Marketplace {
  pub catalog: CatalogService,
  pub cart: CartService,
  pub checkout: CheckoutService,
  pub ledger: LedgerService,
}

impl Marketplace {
  pub fn new(store: Arc<dyn MarketStore>, policy: ListingPolicy) -> Self {
    Self {
      catalog: CatalogService::new(Arc::clone(&store), policy),
      cart: CartService::new(Arc::clone(&store)),
      checkout: CheckoutService::new(Arc::clone(&store)),
      ledger: LedgerService::new(store),
    }
  }
}
