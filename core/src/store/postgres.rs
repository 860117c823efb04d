// core/src/store/postgres.rs

//! PostgreSQL adapter for the marketplace store, backed by `sqlx::PgPool`.
//!
//! Expects the schema in `server/migrations/`. Wallets and users belong to
//! other modules; this adapter only reads them and debits `wallets.balance`.

use super::{MarketStore, PurchaseTx};
use crate::error::{MarketError, Result};
use crate::models::{
  CartItem, CartLine, MarketplaceTransaction, NewLedgerEntry, NewProduct, Product, ProductPatch, ProductStatus,
  TransactionDetails, Wallet,
};
use crate::pagination::PageRequest;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::{debug, instrument};

const PRODUCT_COLUMNS: &str = "id, name, description, price, stock, status, created_at, updated_at";
const CART_ITEM_COLUMNS: &str = "id, user_id, product_id, quantity, created_at, updated_at";
const LEDGER_COLUMNS: &str = "id, reference, wallet_id, product_id, quantity, total_amount, created_at";

#[derive(Clone, Debug)]
pub struct PgMarketStore {
  pool: PgPool,
}

impl PgMarketStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  pub fn pool(&self) -> &PgPool {
    &self.pool
  }
}

/// Flat row of `cart_items JOIN products`.
#[derive(FromRow)]
struct CartLineRow {
  id: i64,
  user_id: i64,
  product_id: i64,
  quantity: i32,
  created_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
  product_name: String,
  product_description: String,
  product_price: i64,
  product_stock: i32,
  product_status: ProductStatus,
  product_created_at: DateTime<Utc>,
  product_updated_at: DateTime<Utc>,
}

impl From<CartLineRow> for CartLine {
  fn from(row: CartLineRow) -> Self {
    let product = Product {
      id: row.product_id,
      name: row.product_name,
      description: row.product_description,
      price: row.product_price,
      stock: row.product_stock,
      status: row.product_status,
      created_at: row.product_created_at,
      updated_at: row.product_updated_at,
    };
    let item = CartItem {
      id: row.id,
      user_id: row.user_id,
      product_id: row.product_id,
      quantity: row.quantity,
      created_at: row.created_at,
      updated_at: row.updated_at,
    };
    CartLine::new(item, product)
  }
}

#[async_trait]
impl MarketStore for PgMarketStore {
  #[instrument(name = "pg::list_products", skip(self))]
  async fn list_products(&self, status: Option<ProductStatus>, page: PageRequest) -> Result<(Vec<Product>, i64)> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE ($1::product_status IS NULL OR status = $1)")
      .bind(status)
      .fetch_one(&self.pool)
      .await?;

    let products: Vec<Product> = sqlx::query_as(&format!(
      "SELECT {} FROM products WHERE ($1::product_status IS NULL OR status = $1) \
       ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
      PRODUCT_COLUMNS
    ))
    .bind(status)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(&self.pool)
    .await?;

    Ok((products, total))
  }

  async fn find_product(&self, id: i64) -> Result<Option<Product>> {
    let product = sqlx::query_as(&format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS))
      .bind(id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(product)
  }

  async fn insert_product(&self, new: &NewProduct) -> Result<Product> {
    let product = sqlx::query_as(&format!(
      "INSERT INTO products (name, description, price, stock, status) VALUES ($1, $2, $3, $4, $5) RETURNING {}",
      PRODUCT_COLUMNS
    ))
    .bind(new.name.trim())
    .bind(&new.description)
    .bind(new.price)
    .bind(new.stock)
    .bind(new.status.unwrap_or(ProductStatus::Active))
    .fetch_one(&self.pool)
    .await?;
    Ok(product)
  }

  async fn update_product(&self, id: i64, patch: &ProductPatch) -> Result<Option<Product>> {
    let product = sqlx::query_as(&format!(
      "UPDATE products SET \
         name = COALESCE($2, name), \
         description = COALESCE($3, description), \
         price = COALESCE($4, price), \
         stock = COALESCE($5, stock), \
         status = COALESCE($6, status), \
         updated_at = NOW() \
       WHERE id = $1 RETURNING {}",
      PRODUCT_COLUMNS
    ))
    .bind(id)
    .bind(patch.name.as_deref().map(str::trim))
    .bind(patch.description.as_deref())
    .bind(patch.price)
    .bind(patch.stock)
    .bind(patch.status)
    .fetch_optional(&self.pool)
    .await?;
    Ok(product)
  }

  async fn set_product_status(&self, id: i64, status: ProductStatus) -> Result<bool> {
    let result = sqlx::query("UPDATE products SET status = $2, updated_at = NOW() WHERE id = $1")
      .bind(id)
      .bind(status)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() == 1)
  }

  async fn upsert_cart_item(&self, user_id: i64, product_id: i64, quantity: i32) -> Result<CartItem> {
    let item: Option<CartItem> = sqlx::query_as(&format!(
      "INSERT INTO cart_items (user_id, product_id, quantity) VALUES ($1, $2, $3) \
       ON CONFLICT (user_id, product_id) DO UPDATE \
       SET quantity = cart_items.quantity + EXCLUDED.quantity, updated_at = NOW() \
       WHERE cart_items.quantity::BIGINT + EXCLUDED.quantity <= 2147483647 \
       RETURNING {}",
      CART_ITEM_COLUMNS
    ))
    .bind(user_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_optional(&self.pool)
    .await?;
    item.ok_or_else(|| MarketError::Validation("cart quantity is out of range".to_string()))
  }

  async fn cart_lines(&self, user_id: i64) -> Result<Vec<CartLine>> {
    let rows: Vec<CartLineRow> = sqlx::query_as(
      "SELECT ci.id, ci.user_id, ci.product_id, ci.quantity, ci.created_at, ci.updated_at, \
              p.name AS product_name, p.description AS product_description, p.price AS product_price, \
              p.stock AS product_stock, p.status AS product_status, \
              p.created_at AS product_created_at, p.updated_at AS product_updated_at \
       FROM cart_items ci JOIN products p ON p.id = ci.product_id \
       WHERE ci.user_id = $1 ORDER BY ci.created_at DESC, ci.id DESC",
    )
    .bind(user_id)
    .fetch_all(&self.pool)
    .await?;
    Ok(rows.into_iter().map(CartLine::from).collect())
  }

  async fn set_cart_quantity(&self, user_id: i64, item_id: i64, quantity: i32) -> Result<Option<CartItem>> {
    let item = sqlx::query_as(&format!(
      "UPDATE cart_items SET quantity = $3, updated_at = NOW() WHERE user_id = $1 AND id = $2 RETURNING {}",
      CART_ITEM_COLUMNS
    ))
    .bind(user_id)
    .bind(item_id)
    .bind(quantity)
    .fetch_optional(&self.pool)
    .await?;
    Ok(item)
  }

  async fn delete_cart_item(&self, user_id: i64, item_id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND id = $2")
      .bind(user_id)
      .bind(item_id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() == 1)
  }

  #[instrument(name = "pg::list_transactions", skip(self))]
  async fn list_transactions(&self, page: PageRequest) -> Result<(Vec<TransactionDetails>, i64)> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM marketplace_transactions")
      .fetch_one(&self.pool)
      .await?;

    let rows = sqlx::query_as(
      "SELECT mt.id, mt.reference, mt.wallet_id, mt.product_id, mt.quantity, mt.total_amount, mt.created_at, \
              p.name AS product_name, u.id AS user_id, u.full_name AS user_name, u.email AS user_email \
       FROM marketplace_transactions mt \
       LEFT JOIN products p ON mt.product_id = p.id \
       LEFT JOIN wallets w ON mt.wallet_id = w.id \
       LEFT JOIN users u ON w.user_id = u.id \
       ORDER BY mt.created_at DESC, mt.id DESC LIMIT $1 OFFSET $2",
    )
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(&self.pool)
    .await?;

    Ok((rows, total))
  }

  async fn begin_purchase(&self) -> Result<Box<dyn PurchaseTx>> {
    let tx = self.pool.begin().await?;
    debug!("Purchase transaction opened.");
    Ok(Box::new(PgPurchaseTx { tx }))
  }
}

/// Rolls back on drop unless [`PurchaseTx::commit`] was called.
pub struct PgPurchaseTx {
  tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl PurchaseTx for PgPurchaseTx {
  async fn lock_cart_items(&mut self, user_id: i64, item_ids: Option<&[i64]>) -> Result<Vec<CartItem>> {
    let items = sqlx::query_as(&format!(
      "SELECT {} FROM cart_items WHERE user_id = $1 AND ($2::BIGINT[] IS NULL OR id = ANY($2)) \
       ORDER BY id FOR UPDATE",
      CART_ITEM_COLUMNS
    ))
    .bind(user_id)
    .bind(item_ids.map(<[i64]>::to_vec))
    .fetch_all(&mut *self.tx)
    .await?;
    Ok(items)
  }

  async fn lock_products(&mut self, ids: &[i64]) -> Result<Vec<Product>> {
    // Row locks are taken in id order so two checkouts never wait on each other crosswise.
    let products = sqlx::query_as(&format!(
      "SELECT {} FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE",
      PRODUCT_COLUMNS
    ))
    .bind(ids.to_vec())
    .fetch_all(&mut *self.tx)
    .await?;
    Ok(products)
  }

  async fn lock_wallet(&mut self, user_id: i64) -> Result<Option<Wallet>> {
    let wallet = sqlx::query_as("SELECT id, user_id, balance FROM wallets WHERE user_id = $1 FOR UPDATE")
      .bind(user_id)
      .fetch_optional(&mut *self.tx)
      .await?;
    Ok(wallet)
  }

  async fn debit_wallet(&mut self, wallet_id: i64, amount: i64) -> Result<i64> {
    let new_balance: Option<i64> = sqlx::query_scalar(
      "UPDATE wallets SET balance = balance - $2, updated_at = NOW() \
       WHERE id = $1 AND balance >= $2 RETURNING balance",
    )
    .bind(wallet_id)
    .bind(amount)
    .fetch_optional(&mut *self.tx)
    .await?;

    match new_balance {
      Some(balance) => Ok(balance),
      None => {
        let available: Option<i64> = sqlx::query_scalar("SELECT balance FROM wallets WHERE id = $1")
          .bind(wallet_id)
          .fetch_optional(&mut *self.tx)
          .await?;
        match available {
          Some(available) => Err(MarketError::InsufficientBalance {
            required: amount,
            available,
          }),
          None => Err(MarketError::not_found("wallet", wallet_id)),
        }
      }
    }
  }

  async fn decrement_stock(&mut self, product_id: i64, quantity: i32) -> Result<i32> {
    let new_stock: Option<i32> = sqlx::query_scalar(
      "UPDATE products SET stock = stock - $2, updated_at = NOW() \
       WHERE id = $1 AND stock >= $2 RETURNING stock",
    )
    .bind(product_id)
    .bind(quantity)
    .fetch_optional(&mut *self.tx)
    .await?;

    match new_stock {
      Some(stock) => Ok(stock),
      None => {
        let available: Option<i32> = sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
          .bind(product_id)
          .fetch_optional(&mut *self.tx)
          .await?;
        match available {
          Some(available) => Err(MarketError::InsufficientStock {
            product_id,
            requested: quantity,
            available,
          }),
          None => Err(MarketError::not_found("product", product_id)),
        }
      }
    }
  }

  async fn insert_ledger_entry(&mut self, entry: &NewLedgerEntry) -> Result<MarketplaceTransaction> {
    let row = sqlx::query_as(&format!(
      "INSERT INTO marketplace_transactions (reference, wallet_id, product_id, quantity, total_amount) \
       VALUES ($1, $2, $3, $4, $5) RETURNING {}",
      LEDGER_COLUMNS
    ))
    .bind(entry.reference)
    .bind(entry.wallet_id)
    .bind(entry.product_id)
    .bind(entry.quantity)
    .bind(entry.total_amount)
    .fetch_one(&mut *self.tx)
    .await?;
    Ok(row)
  }

  async fn delete_cart_items(&mut self, user_id: i64, item_ids: &[i64]) -> Result<u64> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND id = ANY($2)")
      .bind(user_id)
      .bind(item_ids.to_vec())
      .execute(&mut *self.tx)
      .await?;
    Ok(result.rows_affected())
  }

  async fn commit(self: Box<Self>) -> Result<()> {
    self.tx.commit().await?;
    debug!("Purchase transaction committed.");
    Ok(())
  }

  async fn rollback(self: Box<Self>) -> Result<()> {
    self.tx.rollback().await?;
    debug!("Purchase transaction rolled back.");
    Ok(())
  }
}
