// core/src/policy.rs

//! Caller roles and the listing rule that decides which product status a
//! caller may see.

use crate::error::MarketError;
use crate::models::ProductStatus;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Admin,
  #[serde(alias = "mahasiswa")]
  Student,
}

impl Role {
  pub fn is_admin(&self) -> bool {
    matches!(self, Role::Admin)
  }
}

impl FromStr for Role {
  type Err = MarketError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "admin" => Ok(Role::Admin),
      "student" | "mahasiswa" => Ok(Role::Student),
      other => Err(MarketError::Validation(format!("unknown role '{}'", other))),
    }
  }
}

/// Decides the effective status filter of a product listing.
///
/// Roles in `constrained_roles` only ever see active products, whatever
/// filter they asked for. Everyone else gets the filter they requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPolicy {
  constrained_roles: Vec<Role>,
}

impl ListingPolicy {
  pub fn new(constrained_roles: Vec<Role>) -> Self {
    Self { constrained_roles }
  }

  /// A policy that never overrides the requested filter.
  pub fn unrestricted() -> Self {
    Self::new(Vec::new())
  }

  pub fn is_constrained(&self, role: Role) -> bool {
    self.constrained_roles.contains(&role)
  }

  pub fn effective_status(&self, requested: Option<ProductStatus>, role: Role) -> Option<ProductStatus> {
    if self.is_constrained(role) {
      Some(ProductStatus::Active)
    } else {
      requested
    }
  }
}

impl Default for ListingPolicy {
  fn default() -> Self {
    Self::new(vec![Role::Student])
  }
}
