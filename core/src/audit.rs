// core/src/audit.rs

//! Audit trail port. Handlers describe what a caller did as an
//! [`AuditEntry`]; an [`AuditSink`] persists it.

use crate::error::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use sqlx::PgPool;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
  CreateProduct,
  UpdateProduct,
  DeleteProduct,
  PurchaseProduct,
  CartCheckout,
  AddToCart,
  UpdateCartItem,
  RemoveCartItem,
}

impl AuditAction {
  pub fn as_str(&self) -> &'static str {
    match self {
      AuditAction::CreateProduct => "CREATE_PRODUCT",
      AuditAction::UpdateProduct => "UPDATE_PRODUCT",
      AuditAction::DeleteProduct => "DELETE_PRODUCT",
      AuditAction::PurchaseProduct => "PURCHASE_PRODUCT",
      AuditAction::CartCheckout => "CART_CHECKOUT",
      AuditAction::AddToCart => "ADD_TO_CART",
      AuditAction::UpdateCartItem => "UPDATE_CART_ITEM",
      AuditAction::RemoveCartItem => "REMOVE_CART_ITEM",
    }
  }
}

impl fmt::Display for AuditAction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEntity {
  Product,
  Wallet,
  CartItem,
}

impl AuditEntity {
  pub fn as_str(&self) -> &'static str {
    match self {
      AuditEntity::Product => "PRODUCT",
      AuditEntity::Wallet => "WALLET",
      AuditEntity::CartItem => "CART_ITEM",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEntry {
  pub actor_id: i64,
  pub action: AuditAction,
  pub entity: AuditEntity,
  pub entity_id: i64,
  pub details: String,
  pub ip_address: Option<String>,
  pub user_agent: Option<String>,
}

impl AuditEntry {
  pub fn new(actor_id: i64, action: AuditAction, entity: AuditEntity, entity_id: i64, details: impl Into<String>) -> Self {
    Self {
      actor_id,
      action,
      entity,
      entity_id,
      details: details.into(),
      ip_address: None,
      user_agent: None,
    }
  }

  pub fn with_client(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
    self.ip_address = ip_address;
    self.user_agent = user_agent;
    self
  }
}

#[async_trait]
pub trait AuditSink: Send + Sync + 'static {
  async fn record(&self, entry: AuditEntry) -> Result<()>;
}

/// Writes entries to the `audit_logs` table.
#[derive(Clone, Debug)]
pub struct PgAuditSink {
  pool: PgPool,
}

impl PgAuditSink {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl AuditSink for PgAuditSink {
  async fn record(&self, entry: AuditEntry) -> Result<()> {
    sqlx::query(
      "INSERT INTO audit_logs (user_id, action, entity, entity_id, details, ip_address, user_agent) \
       VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(entry.actor_id)
    .bind(entry.action.as_str())
    .bind(entry.entity.as_str())
    .bind(entry.entity_id)
    .bind(&entry.details)
    .bind(entry.ip_address.as_deref())
    .bind(entry.user_agent.as_deref())
    .execute(&self.pool)
    .await?;
    Ok(())
  }
}

/// Keeps entries in memory; for tests and local runs without a database.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
  entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditSink {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn entries(&self) -> Vec<AuditEntry> {
    self.entries.lock().clone()
  }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
  async fn record(&self, entry: AuditEntry) -> Result<()> {
    self.entries.lock().push(entry);
    Ok(())
  }
}
