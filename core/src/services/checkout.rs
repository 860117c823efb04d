// core/src/services/checkout.rs

//! Point purchases, run as a step pipeline over a single storage transaction.
//!
//! Both a direct purchase and a cart checkout go through the same steps:
//!
//! 1. `open_transaction`   begin the storage transaction
//! 2. `collect_lines`      build the purchase lines (locking cart rows for a checkout)
//! 3. `lock_products`      lock products, check availability and stock, price the lines
//! 4. `verify_balance`     lock the buyer's wallet and compare against the total
//! 5. `debit_wallet`
//! 6. `decrement_stock`
//! 7. `record_ledger`      one ledger row per line, all sharing one reference
//! 8. `clear_cart`         skipped for direct purchases
//! 9. `commit_transaction`
//!
//! Any failing step aborts the run; the open transaction is then rolled back
//! so no partial effect survives.

use crate::error::{MarketError, Result};
use crate::models::{MarketplaceTransaction, NewLedgerEntry, Product};
use crate::pipeline::{ContextData, Pipeline, PipelineControl, PipelineResult, SkipCondition};
use crate::store::{MarketStore, PurchaseTx};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

type TxSlot = Arc<Mutex<Option<Box<dyn PurchaseTx>>>>;

/// Where the purchase lines come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseSource {
  Direct { product_id: i64, quantity: i32 },
  /// The caller's cart, restricted to `item_ids` when given.
  Cart { item_ids: Option<Vec<i64>> },
}

impl PurchaseSource {
  pub fn is_direct(&self) -> bool {
    matches!(self, PurchaseSource::Direct { .. })
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseLine {
  pub cart_item_id: Option<i64>,
  pub product_id: i64,
  pub quantity: i32,
  pub unit_price: i64,
  pub amount: i64,
}

impl PurchaseLine {
  fn unpriced(cart_item_id: Option<i64>, product_id: i64, quantity: i32) -> Self {
    Self {
      cart_item_id,
      product_id,
      quantity,
      unit_price: 0,
      amount: 0,
    }
  }
}

/// State shared by the checkout steps of one run.
pub struct CheckoutCtxData {
  pub user_id: i64,
  pub source: PurchaseSource,
  pub reference: Uuid,
  pub lines: Vec<PurchaseLine>,
  pub total_points: i64,
  pub wallet_id: Option<i64>,
  pub remaining_balance: Option<i64>,
  pub transactions: Vec<MarketplaceTransaction>,
  pub committed: bool,
  store: Arc<dyn MarketStore>,
  tx: TxSlot,
}

impl CheckoutCtxData {
  pub fn new(store: Arc<dyn MarketStore>, user_id: i64, source: PurchaseSource) -> Self {
    Self {
      user_id,
      source,
      reference: Uuid::new_v4(),
      lines: Vec::new(),
      total_points: 0,
      wallet_id: None,
      remaining_balance: None,
      transactions: Vec::new(),
      committed: false,
      store,
      tx: Arc::new(Mutex::new(None)),
    }
  }
}

/// Outcome of a committed purchase or checkout.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutReceipt {
  pub reference: Uuid,
  pub wallet_id: i64,
  pub total_points: i64,
  pub remaining_balance: i64,
  pub transactions: Vec<MarketplaceTransaction>,
}

pub struct CheckoutService {
  store: Arc<dyn MarketStore>,
  pipeline: Pipeline<CheckoutCtxData, MarketError>,
}

impl CheckoutService {
  pub fn new(store: Arc<dyn MarketStore>) -> Self {
    Self {
      store,
      pipeline: build_checkout_pipeline(),
    }
  }

  /// Buys `quantity` units of one product straight from the catalog.
  #[instrument(name = "checkout::purchase", skip(self))]
  pub async fn purchase(&self, user_id: i64, product_id: i64, quantity: i32) -> Result<CheckoutReceipt> {
    self
      .execute(user_id, PurchaseSource::Direct { product_id, quantity })
      .await
  }

  /// Buys the caller's cart, or only the listed cart rows. An empty
  /// selection means the whole cart.
  #[instrument(name = "checkout::checkout_cart", skip(self))]
  pub async fn checkout_cart(&self, user_id: i64, item_ids: Option<Vec<i64>>) -> Result<CheckoutReceipt> {
    let item_ids = item_ids.filter(|ids| !ids.is_empty()).map(|mut ids| {
      ids.sort_unstable();
      ids.dedup();
      ids
    });
    self.execute(user_id, PurchaseSource::Cart { item_ids }).await
  }

  async fn execute(&self, user_id: i64, source: PurchaseSource) -> Result<CheckoutReceipt> {
    let ctx = ContextData::new(CheckoutCtxData::new(Arc::clone(&self.store), user_id, source));

    match self.pipeline.run(ctx.clone()).await {
      Ok(PipelineResult::Completed) => {}
      Ok(PipelineResult::Stopped) => {
        rollback_open_transaction(&ctx).await;
        return Err(MarketError::Internal("checkout halted before commit".to_string()));
      }
      Err(e) => {
        rollback_open_transaction(&ctx).await;
        return Err(e);
      }
    }

    let data = ctx.read();
    let receipt = match (data.committed, data.wallet_id, data.remaining_balance) {
      (true, Some(wallet_id), Some(remaining_balance)) => CheckoutReceipt {
        reference: data.reference,
        wallet_id,
        total_points: data.total_points,
        remaining_balance,
        transactions: data.transactions.clone(),
      },
      _ => return Err(MarketError::Internal("checkout finished without a commit".to_string())),
    };
    info!(
      reference = %receipt.reference,
      lines = receipt.transactions.len(),
      total_points = receipt.total_points,
      "Checkout committed."
    );
    Ok(receipt)
  }
}

async fn rollback_open_transaction(ctx: &ContextData<CheckoutCtxData>) {
  let slot = Arc::clone(&ctx.read().tx);
  let open = slot.lock().await.take();
  if let Some(tx) = open {
    if let Err(e) = tx.rollback().await {
      warn!(error = %e, "Rollback of purchase transaction failed.");
    } else {
      debug!("Purchase transaction rolled back.");
    }
  }
}

/// Builds the checkout pipeline with every step handler registered.
pub fn build_checkout_pipeline() -> Pipeline<CheckoutCtxData, MarketError> {
  let direct_purchase: SkipCondition<CheckoutCtxData> = Arc::new(|ctx: ContextData<CheckoutCtxData>| {
    let data = ctx.read();
    data.source.is_direct()
  });

  let mut pipeline = Pipeline::<CheckoutCtxData, MarketError>::new(&[
    ("open_transaction", false, None),
    ("collect_lines", false, None),
    ("lock_products", false, None),
    ("verify_balance", false, None),
    ("debit_wallet", false, None),
    ("decrement_stock", false, None),
    ("record_ledger", false, None),
    ("clear_cart", false, Some(direct_purchase)),
    ("commit_transaction", false, None),
  ]);

  pipeline.on_root("open_transaction", |ctx| Box::pin(open_transaction(ctx)));
  pipeline.on_root("collect_lines", |ctx| Box::pin(collect_lines(ctx)));
  pipeline.on_root("lock_products", |ctx| Box::pin(lock_products(ctx)));
  pipeline.on_root("verify_balance", |ctx| Box::pin(verify_balance(ctx)));
  pipeline.on_root("debit_wallet", |ctx| Box::pin(debit_wallet(ctx)));
  pipeline.on_root("decrement_stock", |ctx| Box::pin(decrement_stock(ctx)));
  pipeline.on_root("record_ledger", |ctx| Box::pin(record_ledger(ctx)));
  pipeline.on_root("clear_cart", |ctx| Box::pin(clear_cart(ctx)));
  pipeline.on_root("commit_transaction", |ctx| Box::pin(commit_transaction(ctx)));
  pipeline
}

async fn tx_guard(ctx: &ContextData<CheckoutCtxData>) -> OwnedMutexGuard<Option<Box<dyn PurchaseTx>>> {
  let slot = Arc::clone(&ctx.read().tx);
  slot.lock_owned().await
}

fn tx_not_open() -> MarketError {
  MarketError::Internal("purchase transaction is not open".to_string())
}

fn amount_overflow() -> MarketError {
  MarketError::Validation("purchase total is too large".to_string())
}

async fn open_transaction(ctx: ContextData<CheckoutCtxData>) -> Result<PipelineControl> {
  let store = Arc::clone(&ctx.read().store);
  let tx = store.begin_purchase().await?;
  let mut slot = tx_guard(&ctx).await;
  *slot = Some(tx);
  Ok(PipelineControl::Continue)
}

async fn collect_lines(ctx: ContextData<CheckoutCtxData>) -> Result<PipelineControl> {
  let (user_id, source) = {
    let data = ctx.read();
    (data.user_id, data.source.clone())
  };

  let lines = match source {
    PurchaseSource::Direct { product_id, quantity } => {
      if quantity < 1 {
        return Err(MarketError::Validation("quantity must be a positive number".to_string()));
      }
      vec![PurchaseLine::unpriced(None, product_id, quantity)]
    }
    PurchaseSource::Cart { item_ids } => {
      let mut guard = tx_guard(&ctx).await;
      let tx = guard.as_mut().ok_or_else(tx_not_open)?;
      let items = tx.lock_cart_items(user_id, item_ids.as_deref()).await?;

      if let Some(ids) = &item_ids {
        if let Some(missing) = ids.iter().find(|id| !items.iter().any(|i| i.id == **id)) {
          return Err(MarketError::not_found("cart item", *missing));
        }
      }
      if items.is_empty() {
        return Err(MarketError::EmptyCart);
      }
      items
        .into_iter()
        .map(|i| PurchaseLine::unpriced(Some(i.id), i.product_id, i.quantity))
        .collect()
    }
  };

  debug!(lines = lines.len(), "Purchase lines collected.");
  ctx.write().lines = lines;
  Ok(PipelineControl::Continue)
}

async fn lock_products(ctx: ContextData<CheckoutCtxData>) -> Result<PipelineControl> {
  let mut lines = ctx.read().lines.clone();

  let mut requested: BTreeMap<i64, i32> = BTreeMap::new();
  for line in &lines {
    let entry = requested.entry(line.product_id).or_insert(0);
    *entry = entry.checked_add(line.quantity).ok_or_else(amount_overflow)?;
  }
  let ids: Vec<i64> = requested.keys().copied().collect();

  let products: HashMap<i64, Product> = {
    let mut guard = tx_guard(&ctx).await;
    let tx = guard.as_mut().ok_or_else(tx_not_open)?;
    tx.lock_products(&ids)
      .await?
      .into_iter()
      .map(|p| (p.id, p))
      .collect()
  };

  for (product_id, quantity) in &requested {
    let product = products
      .get(product_id)
      .ok_or_else(|| MarketError::not_found("product", *product_id))?;
    if !product.is_active() {
      return Err(MarketError::Unavailable {
        product_id: *product_id,
      });
    }
    if *quantity > product.stock {
      return Err(MarketError::InsufficientStock {
        product_id: *product_id,
        requested: *quantity,
        available: product.stock,
      });
    }
  }

  let mut total: i64 = 0;
  for line in &mut lines {
    // Presence checked above.
    let price = products.get(&line.product_id).map_or(0, |p| p.price);
    line.unit_price = price;
    line.amount = price.checked_mul(i64::from(line.quantity)).ok_or_else(amount_overflow)?;
    total = total.checked_add(line.amount).ok_or_else(amount_overflow)?;
  }

  let mut data = ctx.write();
  data.lines = lines;
  data.total_points = total;
  Ok(PipelineControl::Continue)
}

async fn verify_balance(ctx: ContextData<CheckoutCtxData>) -> Result<PipelineControl> {
  let (user_id, total) = {
    let data = ctx.read();
    (data.user_id, data.total_points)
  };

  let wallet = {
    let mut guard = tx_guard(&ctx).await;
    let tx = guard.as_mut().ok_or_else(tx_not_open)?;
    tx.lock_wallet(user_id).await?
  }
  .ok_or_else(|| MarketError::not_found("wallet for user", user_id))?;

  if wallet.balance < total {
    return Err(MarketError::InsufficientBalance {
      required: total,
      available: wallet.balance,
    });
  }

  ctx.write().wallet_id = Some(wallet.id);
  Ok(PipelineControl::Continue)
}

async fn debit_wallet(ctx: ContextData<CheckoutCtxData>) -> Result<PipelineControl> {
  let (wallet_id, total) = {
    let data = ctx.read();
    (data.wallet_id, data.total_points)
  };
  let wallet_id = wallet_id.ok_or_else(|| MarketError::Internal("wallet was not locked".to_string()))?;

  let remaining = {
    let mut guard = tx_guard(&ctx).await;
    let tx = guard.as_mut().ok_or_else(tx_not_open)?;
    tx.debit_wallet(wallet_id, total).await?
  };

  ctx.write().remaining_balance = Some(remaining);
  Ok(PipelineControl::Continue)
}

async fn decrement_stock(ctx: ContextData<CheckoutCtxData>) -> Result<PipelineControl> {
  let lines = ctx.read().lines.clone();

  let mut guard = tx_guard(&ctx).await;
  let tx = guard.as_mut().ok_or_else(tx_not_open)?;
  for line in &lines {
    let left = tx.decrement_stock(line.product_id, line.quantity).await?;
    debug!(product_id = line.product_id, stock = left, "Stock decremented.");
  }
  Ok(PipelineControl::Continue)
}

async fn record_ledger(ctx: ContextData<CheckoutCtxData>) -> Result<PipelineControl> {
  let (reference, wallet_id, lines) = {
    let data = ctx.read();
    (data.reference, data.wallet_id, data.lines.clone())
  };
  let wallet_id = wallet_id.ok_or_else(|| MarketError::Internal("wallet was not locked".to_string()))?;

  let mut rows = Vec::with_capacity(lines.len());
  {
    let mut guard = tx_guard(&ctx).await;
    let tx = guard.as_mut().ok_or_else(tx_not_open)?;
    for line in &lines {
      let entry = NewLedgerEntry {
        reference,
        wallet_id,
        product_id: line.product_id,
        quantity: line.quantity,
        total_amount: line.amount,
      };
      rows.push(tx.insert_ledger_entry(&entry).await?);
    }
  }

  ctx.write().transactions = rows;
  Ok(PipelineControl::Continue)
}

async fn clear_cart(ctx: ContextData<CheckoutCtxData>) -> Result<PipelineControl> {
  let (user_id, item_ids) = {
    let data = ctx.read();
    let ids: Vec<i64> = data.lines.iter().filter_map(|l| l.cart_item_id).collect();
    (data.user_id, ids)
  };

  let mut guard = tx_guard(&ctx).await;
  let tx = guard.as_mut().ok_or_else(tx_not_open)?;
  let removed = tx.delete_cart_items(user_id, &item_ids).await?;
  if removed != item_ids.len() as u64 {
    return Err(MarketError::Internal(format!(
      "expected to clear {} cart rows, cleared {}",
      item_ids.len(),
      removed
    )));
  }
  Ok(PipelineControl::Continue)
}

async fn commit_transaction(ctx: ContextData<CheckoutCtxData>) -> Result<PipelineControl> {
  let open = tx_guard(&ctx).await.take();
  let tx = open.ok_or_else(tx_not_open)?;
  tx.commit().await?;
  ctx.write().committed = true;
  Ok(PipelineControl::Continue)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn pipeline_declares_every_step_in_order() {
    let pipeline = build_checkout_pipeline();
    assert_eq!(
      pipeline.step_names(),
      vec![
        "open_transaction",
        "collect_lines",
        "lock_products",
        "verify_balance",
        "debit_wallet",
        "decrement_stock",
        "record_ledger",
        "clear_cart",
        "commit_transaction",
      ]
    );
  }

  #[test]
  fn direct_source_is_detected() {
    assert!(PurchaseSource::Direct {
      product_id: 1,
      quantity: 1
    }
    .is_direct());
    assert!(!PurchaseSource::Cart { item_ids: None }.is_direct());
  }
}
