// core/src/store/memory.rs

//! In-memory adapter for the marketplace store, used by tests, benchmarks
//! and local demos.
//!
//! All state sits behind one async mutex. A [`PurchaseTx`] holds that mutex
//! for its whole lifetime and works on a copy of the state; `commit` swaps
//! the copy in, dropping the handle throws it away. Purchases therefore
//! serialize, and nothing else may call back into the store while a purchase
//! handle is alive.

use super::{MarketStore, PurchaseTx};
use crate::error::{MarketError, Result};
use crate::models::{
  CartItem, CartLine, MarketplaceTransaction, NewLedgerEntry, NewProduct, Product, ProductPatch, ProductStatus,
  TransactionDetails, Wallet,
};
use crate::pagination::PageRequest;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Clone)]
struct MemoryUser {
  full_name: String,
  email: String,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
  last_id: i64,
  products: BTreeMap<i64, Product>,
  cart_items: BTreeMap<i64, CartItem>,
  wallets: BTreeMap<i64, Wallet>,
  users: BTreeMap<i64, MemoryUser>,
  transactions: Vec<MarketplaceTransaction>,
}

impl MemoryState {
  fn next_id(&mut self) -> i64 {
    self.last_id += 1;
    self.last_id
  }

  fn wallet_for_user(&self, user_id: i64) -> Option<&Wallet> {
    self.wallets.values().find(|w| w.user_id == user_id)
  }
}

#[derive(Clone, Default)]
pub struct InMemoryMarketStore {
  state: Arc<Mutex<MemoryState>>,
}

impl InMemoryMarketStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers a user for ledger display joins.
  pub async fn insert_user(&self, user_id: i64, full_name: &str, email: &str) {
    let mut state = self.state.lock().await;
    state.users.insert(
      user_id,
      MemoryUser {
        full_name: full_name.to_string(),
        email: email.to_string(),
      },
    );
  }

  /// Opens a wallet for `user_id`, or resets the balance of the existing one.
  pub async fn insert_wallet(&self, user_id: i64, balance: i64) -> Wallet {
    let mut state = self.state.lock().await;
    if let Some(existing) = state.wallets.values_mut().find(|w| w.user_id == user_id) {
      existing.balance = balance;
      return existing.clone();
    }
    let wallet = Wallet {
      id: state.next_id(),
      user_id,
      balance,
    };
    state.wallets.insert(wallet.id, wallet.clone());
    wallet
  }

  pub async fn wallet_for_user(&self, user_id: i64) -> Option<Wallet> {
    self.state.lock().await.wallet_for_user(user_id).cloned()
  }

  pub async fn transactions(&self) -> Vec<MarketplaceTransaction> {
    self.state.lock().await.transactions.clone()
  }
}

#[async_trait]
impl MarketStore for InMemoryMarketStore {
  async fn list_products(&self, status: Option<ProductStatus>, page: PageRequest) -> Result<(Vec<Product>, i64)> {
    let state = self.state.lock().await;
    let mut matching: Vec<&Product> = state
      .products
      .values()
      .filter(|p| status.map_or(true, |s| p.status == s))
      .collect();
    matching.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

    let total = matching.len() as i64;
    let items = matching
      .into_iter()
      .skip(page.offset() as usize)
      .take(page.limit() as usize)
      .cloned()
      .collect();
    Ok((items, total))
  }

  async fn find_product(&self, id: i64) -> Result<Option<Product>> {
    Ok(self.state.lock().await.products.get(&id).cloned())
  }

  async fn insert_product(&self, new: &NewProduct) -> Result<Product> {
    let mut state = self.state.lock().await;
    let now = Utc::now();
    let product = Product {
      id: state.next_id(),
      name: new.name.trim().to_string(),
      description: new.description.clone(),
      price: new.price,
      stock: new.stock,
      status: new.status.unwrap_or(ProductStatus::Active),
      created_at: now,
      updated_at: now,
    };
    state.products.insert(product.id, product.clone());
    Ok(product)
  }

  async fn update_product(&self, id: i64, patch: &ProductPatch) -> Result<Option<Product>> {
    let mut state = self.state.lock().await;
    Ok(state.products.get_mut(&id).map(|product| {
      patch.apply_to(product);
      product.clone()
    }))
  }

  async fn set_product_status(&self, id: i64, status: ProductStatus) -> Result<bool> {
    let mut state = self.state.lock().await;
    match state.products.get_mut(&id) {
      Some(product) => {
        product.status = status;
        product.updated_at = Utc::now();
        Ok(true)
      }
      None => Ok(false),
    }
  }

  async fn upsert_cart_item(&self, user_id: i64, product_id: i64, quantity: i32) -> Result<CartItem> {
    let mut state = self.state.lock().await;
    let now = Utc::now();
    if let Some(existing) = state
      .cart_items
      .values_mut()
      .find(|i| i.user_id == user_id && i.product_id == product_id)
    {
      existing.quantity = existing
        .quantity
        .checked_add(quantity)
        .ok_or_else(|| MarketError::Validation("cart quantity is out of range".to_string()))?;
      existing.updated_at = now;
      return Ok(existing.clone());
    }
    let item = CartItem {
      id: state.next_id(),
      user_id,
      product_id,
      quantity,
      created_at: now,
      updated_at: now,
    };
    state.cart_items.insert(item.id, item.clone());
    Ok(item)
  }

  async fn cart_lines(&self, user_id: i64) -> Result<Vec<CartLine>> {
    let state = self.state.lock().await;
    let mut lines: Vec<CartLine> = state
      .cart_items
      .values()
      .filter(|i| i.user_id == user_id)
      .filter_map(|i| state.products.get(&i.product_id).map(|p| CartLine::new(i.clone(), p.clone())))
      .collect();
    lines.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
    Ok(lines)
  }

  async fn set_cart_quantity(&self, user_id: i64, item_id: i64, quantity: i32) -> Result<Option<CartItem>> {
    let mut state = self.state.lock().await;
    Ok(
      state
        .cart_items
        .get_mut(&item_id)
        .filter(|i| i.user_id == user_id)
        .map(|item| {
          item.quantity = quantity;
          item.updated_at = Utc::now();
          item.clone()
        }),
    )
  }

  async fn delete_cart_item(&self, user_id: i64, item_id: i64) -> Result<bool> {
    let mut state = self.state.lock().await;
    let owned = state.cart_items.get(&item_id).map_or(false, |i| i.user_id == user_id);
    if owned {
      state.cart_items.remove(&item_id);
    }
    Ok(owned)
  }

  async fn list_transactions(&self, page: PageRequest) -> Result<(Vec<TransactionDetails>, i64)> {
    let state = self.state.lock().await;
    let mut rows: Vec<&MarketplaceTransaction> = state.transactions.iter().collect();
    rows.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

    let total = rows.len() as i64;
    let items = rows
      .into_iter()
      .skip(page.offset() as usize)
      .take(page.limit() as usize)
      .map(|t| {
        let user_id = state.wallets.get(&t.wallet_id).map(|w| w.user_id);
        let user = user_id.and_then(|id| state.users.get(&id));
        TransactionDetails {
          id: t.id,
          reference: t.reference,
          wallet_id: t.wallet_id,
          product_id: t.product_id,
          quantity: t.quantity,
          total_amount: t.total_amount,
          created_at: t.created_at,
          product_name: state.products.get(&t.product_id).map(|p| p.name.clone()),
          user_id,
          user_name: user.map(|u| u.full_name.clone()),
          user_email: user.map(|u| u.email.clone()),
        }
      })
      .collect();
    Ok((items, total))
  }

  async fn begin_purchase(&self) -> Result<Box<dyn PurchaseTx>> {
    let guard = Arc::clone(&self.state).lock_owned().await;
    let working = guard.clone();
    Ok(Box::new(MemoryPurchaseTx { guard, working }))
  }
}

struct MemoryPurchaseTx {
  guard: OwnedMutexGuard<MemoryState>,
  working: MemoryState,
}

#[async_trait]
impl PurchaseTx for MemoryPurchaseTx {
  async fn lock_cart_items(&mut self, user_id: i64, item_ids: Option<&[i64]>) -> Result<Vec<CartItem>> {
    Ok(
      self
        .working
        .cart_items
        .values()
        .filter(|i| i.user_id == user_id)
        .filter(|i| item_ids.map_or(true, |ids| ids.contains(&i.id)))
        .cloned()
        .collect(),
    )
  }

  async fn lock_products(&mut self, ids: &[i64]) -> Result<Vec<Product>> {
    Ok(
      self
        .working
        .products
        .values()
        .filter(|p| ids.contains(&p.id))
        .cloned()
        .collect(),
    )
  }

  async fn lock_wallet(&mut self, user_id: i64) -> Result<Option<Wallet>> {
    Ok(self.working.wallet_for_user(user_id).cloned())
  }

  async fn debit_wallet(&mut self, wallet_id: i64, amount: i64) -> Result<i64> {
    let wallet = self
      .working
      .wallets
      .get_mut(&wallet_id)
      .ok_or_else(|| MarketError::not_found("wallet", wallet_id))?;
    if wallet.balance < amount {
      return Err(MarketError::InsufficientBalance {
        required: amount,
        available: wallet.balance,
      });
    }
    wallet.balance -= amount;
    Ok(wallet.balance)
  }

  async fn decrement_stock(&mut self, product_id: i64, quantity: i32) -> Result<i32> {
    let product = self
      .working
      .products
      .get_mut(&product_id)
      .ok_or_else(|| MarketError::not_found("product", product_id))?;
    if product.stock < quantity {
      return Err(MarketError::InsufficientStock {
        product_id,
        requested: quantity,
        available: product.stock,
      });
    }
    product.stock -= quantity;
    product.updated_at = Utc::now();
    Ok(product.stock)
  }

  async fn insert_ledger_entry(&mut self, entry: &NewLedgerEntry) -> Result<MarketplaceTransaction> {
    let row = MarketplaceTransaction {
      id: self.working.next_id(),
      reference: entry.reference,
      wallet_id: entry.wallet_id,
      product_id: entry.product_id,
      quantity: entry.quantity,
      total_amount: entry.total_amount,
      created_at: Utc::now(),
    };
    self.working.transactions.push(row.clone());
    Ok(row)
  }

  async fn delete_cart_items(&mut self, user_id: i64, item_ids: &[i64]) -> Result<u64> {
    let before = self.working.cart_items.len();
    self
      .working
      .cart_items
      .retain(|id, item| !(item.user_id == user_id && item_ids.contains(id)));
    Ok((before - self.working.cart_items.len()) as u64)
  }

  async fn commit(self: Box<Self>) -> Result<()> {
    let MemoryPurchaseTx { mut guard, working } = *self;
    *guard = working;
    Ok(())
  }

  async fn rollback(self: Box<Self>) -> Result<()> {
    Ok(())
  }
}
