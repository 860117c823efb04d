// core/src/models/transaction.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// An immutable ledger row written by a successful purchase or checkout.
///
/// Every row produced by the same checkout shares its `reference`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct MarketplaceTransaction {
  pub id: i64,
  pub reference: Uuid,
  pub wallet_id: i64,
  pub product_id: i64,
  pub quantity: i32,
  pub total_amount: i64,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLedgerEntry {
  pub reference: Uuid,
  pub wallet_id: i64,
  pub product_id: i64,
  pub quantity: i32,
  pub total_amount: i64,
}

/// Ledger row joined with product and purchaser for the admin listing.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TransactionDetails {
  pub id: i64,
  pub reference: Uuid,
  pub wallet_id: i64,
  pub product_id: i64,
  pub quantity: i32,
  pub total_amount: i64,
  pub created_at: DateTime<Utc>,
  pub product_name: Option<String>,
  pub user_id: Option<i64>,
  pub user_name: Option<String>,
  pub user_email: Option<String>,
}
