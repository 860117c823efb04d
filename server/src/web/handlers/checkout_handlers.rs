// server/src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use market::{AuditAction, AuditEntity, AuditEntry, CheckoutReceipt};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::{AuthenticatedUser, RequestMeta};

#[derive(Deserialize, Debug)]
pub struct PurchaseRequestPayload {
  pub product_id: i64,
  pub quantity: i32,
}

/// Body of `POST /cart/checkout`. The body itself may be omitted.
#[derive(Deserialize, Debug, Default)]
pub struct CheckoutRequestPayload {
  #[serde(default)]
  pub item_ids: Option<Vec<i64>>,
}

impl CheckoutRequestPayload {
  fn from_body(body: &[u8]) -> Result<Self, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
      return Ok(Self::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::Validation(format!("Invalid JSON payload: {}", e)))
  }
}

fn receipt_details(receipt: &CheckoutReceipt) -> String {
  format!(
    "Spent {} points over {} line(s), reference {}",
    receipt.total_points,
    receipt.transactions.len(),
    receipt.reference
  )
}

#[instrument(
    name = "handler::purchase",
    skip(app_state, auth_user, meta, req_payload),
    fields(user_id = auth_user.user_id, product_id = req_payload.product_id, quantity = req_payload.quantity)
)]
pub async fn purchase_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  meta: RequestMeta,
  req_payload: web::Json<PurchaseRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let receipt = app_state
    .market
    .checkout
    .purchase(auth_user.user_id, payload.product_id, payload.quantity)
    .await?;
  info!(reference = %receipt.reference, remaining_balance = receipt.remaining_balance, "Purchase completed.");

  app_state.record_audit(
    AuditEntry::new(
      auth_user.user_id,
      AuditAction::PurchaseProduct,
      AuditEntity::Product,
      payload.product_id,
      receipt_details(&receipt),
    )
    .with_client(meta.ip_address, meta.user_agent),
  );

  Ok(HttpResponse::Ok().json(json!({
      "message": "Purchase completed successfully.",
      "receipt": receipt
  })))
}

#[instrument(name = "handler::checkout_cart", skip(app_state, auth_user, meta, body), fields(user_id = auth_user.user_id))]
pub async fn checkout_cart_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  meta: RequestMeta,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let payload = CheckoutRequestPayload::from_body(&body)?;
  let receipt = app_state
    .market
    .checkout
    .checkout_cart(auth_user.user_id, payload.item_ids)
    .await?;
  info!(reference = %receipt.reference, lines = receipt.transactions.len(), "Cart checked out.");

  app_state.record_audit(
    AuditEntry::new(
      auth_user.user_id,
      AuditAction::CartCheckout,
      AuditEntity::Wallet,
      receipt.wallet_id,
      receipt_details(&receipt),
    )
    .with_client(meta.ip_address, meta.user_agent),
  );

  Ok(HttpResponse::Ok().json(json!({
      "message": "Checkout completed successfully.",
      "receipt": receipt
  })))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_body_means_whole_cart() {
    assert_eq!(CheckoutRequestPayload::from_body(b"").unwrap().item_ids, None);
    assert_eq!(CheckoutRequestPayload::from_body(b" \n").unwrap().item_ids, None);
    assert_eq!(CheckoutRequestPayload::from_body(b"{}").unwrap().item_ids, None);
  }

  #[test]
  fn selection_is_parsed_and_garbage_rejected() {
    let payload = CheckoutRequestPayload::from_body(br#"{"item_ids":[3,1]}"#).unwrap();
    assert_eq!(payload.item_ids, Some(vec![3, 1]));
    assert!(matches!(
      CheckoutRequestPayload::from_body(b"{not json"),
      Err(AppError::Validation(_))
    ));
  }
}
