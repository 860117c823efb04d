// core/src/services/cart.rs

use crate::error::{MarketError, Result};
use crate::models::{CartItem, CartView};
use crate::store::MarketStore;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub struct CartService {
  store: Arc<dyn MarketStore>,
}

impl CartService {
  pub fn new(store: Arc<dyn MarketStore>) -> Self {
    Self { store }
  }

  pub async fn get_cart(&self, user_id: i64) -> Result<CartView> {
    let lines = self.store.cart_lines(user_id).await?;
    Ok(CartView::from_lines(lines))
  }

  /// Adds `quantity` units of a product. A product already in the cart has
  /// its quantity increased instead of getting a second row. `quantity` may
  /// not exceed the stock left over after what the cart already holds.
  #[instrument(name = "cart::add_item", skip(self))]
  pub async fn add_item(&self, user_id: i64, product_id: i64, quantity: i32) -> Result<CartItem> {
    validate_quantity(quantity)?;

    let product = self
      .store
      .find_product(product_id)
      .await?
      .ok_or_else(|| MarketError::not_found("product", product_id))?;
    if !product.is_active() {
      return Err(MarketError::Unavailable { product_id });
    }

    let in_cart = self
      .store
      .cart_lines(user_id)
      .await?
      .into_iter()
      .find(|line| line.product_id == product_id)
      .map_or(0, |line| line.quantity);
    let room = product.stock.saturating_sub(in_cart).max(0);
    ensure_in_stock(product_id, quantity, room)?;

    let item = self.store.upsert_cart_item(user_id, product_id, quantity).await?;
    info!(cart_item_id = item.id, new_quantity = item.quantity, "Cart item added.");
    Ok(item)
  }

  /// Sets the absolute quantity of a cart row. Quantities below one are
  /// rejected; use [`CartService::remove_item`] to drop a row. Like
  /// [`CartService::add_item`], the row may never hold more than the stock.
  #[instrument(name = "cart::update_item", skip(self))]
  pub async fn update_item(&self, user_id: i64, item_id: i64, quantity: i32) -> Result<CartItem> {
    validate_quantity(quantity)?;
    let line = self
      .store
      .cart_lines(user_id)
      .await?
      .into_iter()
      .find(|line| line.id == item_id)
      .ok_or_else(|| MarketError::not_found("cart item", item_id))?;
    ensure_in_stock(line.product_id, quantity, line.product.stock)?;

    self
      .store
      .set_cart_quantity(user_id, item_id, quantity)
      .await?
      .ok_or_else(|| MarketError::not_found("cart item", item_id))
  }

  #[instrument(name = "cart::remove_item", skip(self))]
  pub async fn remove_item(&self, user_id: i64, item_id: i64) -> Result<()> {
    if !self.store.delete_cart_item(user_id, item_id).await? {
      return Err(MarketError::not_found("cart item", item_id));
    }
    Ok(())
  }
}

fn validate_quantity(quantity: i32) -> Result<()> {
  if quantity < 1 {
    return Err(MarketError::Validation("quantity must be a positive number".to_string()));
  }
  Ok(())
}

/// A cart row never holds more units than the product has in stock.
fn ensure_in_stock(product_id: i64, requested: i32, available: i32) -> Result<()> {
  if requested > available {
    warn!(product_id, requested, available, "Cart quantity exceeds stock.");
    return Err(MarketError::InsufficientStock {
      product_id,
      requested,
      available,
    });
  }
  Ok(())
}
