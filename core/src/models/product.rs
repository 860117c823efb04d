// core/src/models/product.rs

use crate::error::{MarketError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};
use std::fmt;
use std::str::FromStr;

pub const MAX_PRODUCT_NAME_LEN: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "product_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
  Active,
  Inactive,
}

impl ProductStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      ProductStatus::Active => "active",
      ProductStatus::Inactive => "inactive",
    }
  }
}

impl fmt::Display for ProductStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ProductStatus {
  type Err = MarketError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "active" => Ok(ProductStatus::Active),
      "inactive" => Ok(ProductStatus::Inactive),
      other => Err(MarketError::Validation(format!(
        "invalid product status '{}': expected 'active' or 'inactive'",
        other
      ))),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Product {
  pub id: i64,
  pub name: String,
  pub description: String,
  pub price: i64,
  pub stock: i32,
  pub status: ProductStatus,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Product {
  pub fn is_active(&self) -> bool {
    self.status == ProductStatus::Active
  }
}

/// Payload for creating a product. `status` defaults to active.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
  pub name: String,
  #[serde(default)]
  pub description: String,
  pub price: i64,
  pub stock: i32,
  #[serde(default)]
  pub status: Option<ProductStatus>,
}

impl NewProduct {
  pub fn validate(&self) -> Result<()> {
    validate_name(&self.name)?;
    validate_price(self.price)?;
    validate_stock(self.stock)
  }
}

/// Partial product update. Only `Some` fields are written.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
  pub name: Option<String>,
  pub description: Option<String>,
  pub price: Option<i64>,
  pub stock: Option<i32>,
  pub status: Option<ProductStatus>,
}

impl ProductPatch {
  pub fn is_empty(&self) -> bool {
    self.name.is_none()
      && self.description.is_none()
      && self.price.is_none()
      && self.stock.is_none()
      && self.status.is_none()
  }

  pub fn validate(&self) -> Result<()> {
    if self.is_empty() {
      return Err(MarketError::Validation(
        "at least one field must be provided for update".to_string(),
      ));
    }
    if let Some(name) = &self.name {
      validate_name(name)?;
    }
    if let Some(price) = self.price {
      validate_price(price)?;
    }
    if let Some(stock) = self.stock {
      validate_stock(stock)?;
    }
    Ok(())
  }

  /// Applies the patch to an in-memory product, bumping `updated_at`.
  pub fn apply_to(&self, product: &mut Product) {
    if let Some(name) = &self.name {
      product.name = name.trim().to_string();
    }
    if let Some(description) = &self.description {
      product.description = description.clone();
    }
    if let Some(price) = self.price {
      product.price = price;
    }
    if let Some(stock) = self.stock {
      product.stock = stock;
    }
    if let Some(status) = self.status {
      product.status = status;
    }
    product.updated_at = Utc::now();
  }
}

fn validate_name(name: &str) -> Result<()> {
  let trimmed = name.trim();
  if trimmed.is_empty() {
    return Err(MarketError::Validation("name is required".to_string()));
  }
  if trimmed.chars().count() > MAX_PRODUCT_NAME_LEN {
    return Err(MarketError::Validation(format!(
      "name must be at most {} characters",
      MAX_PRODUCT_NAME_LEN
    )));
  }
  Ok(())
}

fn validate_price(price: i64) -> Result<()> {
  if price <= 0 {
    return Err(MarketError::Validation("price must be greater than zero".to_string()));
  }
  Ok(())
}

fn validate_stock(stock: i32) -> Result<()> {
  if stock < 0 {
    return Err(MarketError::Validation("stock cannot be negative".to_string()));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn new_product(name: &str, price: i64, stock: i32) -> NewProduct {
    NewProduct {
      name: name.to_string(),
      description: String::new(),
      price,
      stock,
      status: None,
    }
  }

  #[test]
  fn new_product_validation_rejects_bad_fields() {
    assert!(new_product("Tumbler", 30, 5).validate().is_ok());
    assert!(new_product("   ", 30, 5).validate().is_err());
    assert!(new_product("Tumbler", 0, 5).validate().is_err());
    assert!(new_product("Tumbler", 30, -1).validate().is_err());
    assert!(new_product(&"x".repeat(256), 30, 5).validate().is_err());
  }

  #[test]
  fn empty_patch_is_rejected() {
    let err = ProductPatch::default().validate().unwrap_err();
    assert!(matches!(err, MarketError::Validation(_)));
  }

  #[test]
  fn status_parses_case_insensitively() {
    assert_eq!("Active".parse::<ProductStatus>().unwrap(), ProductStatus::Active);
    assert_eq!(" inactive ".parse::<ProductStatus>().unwrap(), ProductStatus::Inactive);
    assert!("archived".parse::<ProductStatus>().is_err());
  }

  #[test]
  fn payload_defaults_description_and_status() {
    let new: NewProduct = serde_json::from_str(r#"{"name":"Tumbler","price":30,"stock":5}"#).unwrap();
    assert_eq!(new.description, "");
    assert_eq!(new.status, None);

    let patch: ProductPatch = serde_json::from_str(r#"{"status":"inactive"}"#).unwrap();
    assert_eq!(patch.status, Some(ProductStatus::Inactive));
    assert!(!patch.is_empty());
  }
}
