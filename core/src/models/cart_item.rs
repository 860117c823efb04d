// core/src/models/cart_item.rs

use super::product::Product;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One row of a user's cart. `(user_id, product_id)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CartItem {
  pub id: i64,
  pub user_id: i64,
  pub product_id: i64,
  pub quantity: i32,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// A cart row joined with its product, as shown to the cart owner.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
  pub id: i64,
  pub product_id: i64,
  pub quantity: i32,
  pub subtotal: i64,
  pub product: Product,
  pub created_at: DateTime<Utc>,
}

impl CartLine {
  pub fn new(item: CartItem, product: Product) -> Self {
    let subtotal = product.price.saturating_mul(i64::from(item.quantity));
    Self {
      id: item.id,
      product_id: item.product_id,
      quantity: item.quantity,
      subtotal,
      product,
      created_at: item.created_at,
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct CartView {
  pub items: Vec<CartLine>,
  pub total_price: i64,
}

impl CartView {
  pub fn from_lines(items: Vec<CartLine>) -> Self {
    let total_price = items.iter().fold(0i64, |acc, line| acc.saturating_add(line.subtotal));
    Self { items, total_price }
  }
}
