// core/src/models/wallet.rs

use serde::Serialize;
use sqlx::FromRow;

/// A student's point wallet. Owned by the wallet module; the marketplace
/// only locks and debits it during a purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Wallet {
  pub id: i64,
  pub user_id: i64,
  pub balance: i64,
}
