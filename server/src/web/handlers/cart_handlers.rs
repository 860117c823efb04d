// server/src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use market::{AuditAction, AuditEntity, AuditEntry};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::{AuthenticatedUser, RequestMeta};

#[derive(Deserialize, Debug)]
pub struct AddToCartRequestPayload {
  pub product_id: i64,
  pub quantity: i32,
}

#[derive(Deserialize, Debug)]
pub struct UpdateCartItemPayload {
  pub quantity: i32,
}

#[instrument(name = "handler::get_cart", skip(app_state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_cart_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let cart = app_state.market.cart.get_cart(auth_user.user_id).await?;
  Ok(HttpResponse::Ok().json(json!({
      "message": "Cart fetched successfully.",
      "cart": cart
  })))
}

#[instrument(
    name = "handler::add_to_cart",
    skip(app_state, req_payload, auth_user, meta),
    fields(user_id = auth_user.user_id, product_id = req_payload.product_id, quantity = req_payload.quantity)
)]
pub async fn add_to_cart_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  meta: RequestMeta,
  req_payload: web::Json<AddToCartRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let item = app_state
    .market
    .cart
    .add_item(auth_user.user_id, payload.product_id, payload.quantity)
    .await?;
  info!(cart_item_id = item.id, new_quantity = item.quantity, "Item added to cart.");

  app_state.record_audit(
    AuditEntry::new(
      auth_user.user_id,
      AuditAction::AddToCart,
      AuditEntity::CartItem,
      item.id,
      format!("Added {} x product {} to cart", payload.quantity, payload.product_id),
    )
    .with_client(meta.ip_address, meta.user_agent),
  );

  Ok(HttpResponse::Created().json(json!({
      "message": "Item added to cart successfully.",
      "cart_item": item
  })))
}

#[instrument(name = "handler::update_cart_item", skip(app_state, auth_user, meta, path, payload), fields(user_id = auth_user.user_id, cart_item_id = %path.as_ref()))]
pub async fn update_cart_item_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  meta: RequestMeta,
  path: web::Path<i64>,
  payload: web::Json<UpdateCartItemPayload>,
) -> Result<HttpResponse, AppError> {
  let quantity = payload.into_inner().quantity;
  let item = app_state
    .market
    .cart
    .update_item(auth_user.user_id, path.into_inner(), quantity)
    .await?;

  app_state.record_audit(
    AuditEntry::new(
      auth_user.user_id,
      AuditAction::UpdateCartItem,
      AuditEntity::CartItem,
      item.id,
      format!("Set cart quantity to {}", quantity),
    )
    .with_client(meta.ip_address, meta.user_agent),
  );

  Ok(HttpResponse::Ok().json(json!({
      "message": "Cart item updated successfully.",
      "cart_item": item
  })))
}

#[instrument(name = "handler::remove_cart_item", skip(app_state, auth_user, meta, path), fields(user_id = auth_user.user_id, cart_item_id = %path.as_ref()))]
pub async fn remove_cart_item_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  meta: RequestMeta,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let item_id = path.into_inner();
  app_state.market.cart.remove_item(auth_user.user_id, item_id).await?;

  app_state.record_audit(
    AuditEntry::new(
      auth_user.user_id,
      AuditAction::RemoveCartItem,
      AuditEntity::CartItem,
      item_id,
      "Removed item from cart",
    )
    .with_client(meta.ip_address, meta.user_agent),
  );

  Ok(HttpResponse::Ok().json(json!({
      "message": "Cart item removed successfully."
  })))
}
