// core/src/store/mod.rs

//! Storage port for the marketplace.
//!
//! [`MarketStore`] covers the plain reads and single-statement writes used by
//! the catalog, cart and ledger services. Everything a purchase touches goes
//! through a [`PurchaseTx`] obtained from [`MarketStore::begin_purchase`]:
//! the handle owns one storage transaction, `commit` makes its writes
//! visible, and dropping it without committing discards them.

pub mod memory;
pub mod postgres;

use crate::error::Result;
use crate::models::{
  CartItem, CartLine, MarketplaceTransaction, NewLedgerEntry, NewProduct, Product, ProductPatch, ProductStatus,
  TransactionDetails, Wallet,
};
use crate::pagination::PageRequest;
use async_trait::async_trait;

pub use memory::InMemoryMarketStore;
pub use postgres::PgMarketStore;

#[async_trait]
pub trait MarketStore: Send + Sync + 'static {
  /// Products matching `status` (all when `None`), newest first, plus the
  /// total number of matches.
  async fn list_products(&self, status: Option<ProductStatus>, page: PageRequest) -> Result<(Vec<Product>, i64)>;

  async fn find_product(&self, id: i64) -> Result<Option<Product>>;

  async fn insert_product(&self, new: &NewProduct) -> Result<Product>;

  /// Writes the `Some` fields of `patch`. `None` when the product does not exist.
  async fn update_product(&self, id: i64, patch: &ProductPatch) -> Result<Option<Product>>;

  /// Returns `false` when the product does not exist.
  async fn set_product_status(&self, id: i64, status: ProductStatus) -> Result<bool>;

  /// Inserts the `(user, product)` row or adds `quantity` to the existing one.
  async fn upsert_cart_item(&self, user_id: i64, product_id: i64, quantity: i32) -> Result<CartItem>;

  async fn cart_lines(&self, user_id: i64) -> Result<Vec<CartLine>>;

  async fn set_cart_quantity(&self, user_id: i64, item_id: i64, quantity: i32) -> Result<Option<CartItem>>;

  async fn delete_cart_item(&self, user_id: i64, item_id: i64) -> Result<bool>;

  async fn list_transactions(&self, page: PageRequest) -> Result<(Vec<TransactionDetails>, i64)>;

  async fn begin_purchase(&self) -> Result<Box<dyn PurchaseTx>>;
}

/// A transaction-scoped handle for one purchase or checkout.
///
/// `lock_*` methods read rows and hold them until the handle commits or is
/// dropped, so concurrent purchases of the same product or by the same
/// wallet serialize on the storage side.
#[async_trait]
pub trait PurchaseTx: Send {
  /// The user's cart rows, restricted to `item_ids` when given, ordered by id.
  async fn lock_cart_items(&mut self, user_id: i64, item_ids: Option<&[i64]>) -> Result<Vec<CartItem>>;

  /// The existing products among `ids`, ordered by id.
  async fn lock_products(&mut self, ids: &[i64]) -> Result<Vec<Product>>;

  async fn lock_wallet(&mut self, user_id: i64) -> Result<Option<Wallet>>;

  /// Debits `amount` and returns the new balance. Never overdraws.
  async fn debit_wallet(&mut self, wallet_id: i64, amount: i64) -> Result<i64>;

  /// Removes `quantity` units and returns the new stock. Never goes below zero.
  async fn decrement_stock(&mut self, product_id: i64, quantity: i32) -> Result<i32>;

  async fn insert_ledger_entry(&mut self, entry: &NewLedgerEntry) -> Result<MarketplaceTransaction>;

  async fn delete_cart_items(&mut self, user_id: i64, item_ids: &[i64]) -> Result<u64>;

  async fn commit(self: Box<Self>) -> Result<()>;

  /// Discards every write made through this handle. Dropping the handle has
  /// the same effect; this variant lets callers observe rollback failures.
  async fn rollback(self: Box<Self>) -> Result<()>;
}
