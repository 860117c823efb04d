// core/src/error.rs
use thiserror::Error;

/// Failures raised by the pipeline machinery itself rather than by a handler.
#[derive(Debug, Error)]
pub enum PipelineError {
  #[error("Handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },
}

#[derive(Debug, Error)]
pub enum MarketError {
  #[error("{0}")]
  Validation(String),

  #[error("{entity} {id} not found")]
  NotFound { entity: &'static str, id: i64 },

  #[error("insufficient stock for product {product_id}: requested {requested}, available {available}")]
  InsufficientStock {
    product_id: i64,
    requested: i32,
    available: i32,
  },

  #[error("insufficient balance: required {required} points, available {available}")]
  InsufficientBalance { required: i64, available: i64 },

  #[error("product {product_id} is not available for purchase")]
  Unavailable { product_id: i64 },

  #[error("cart is empty")]
  EmptyCart,

  #[error("database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("checkout pipeline error: {0}")]
  Pipeline(#[from] PipelineError),

  #[error("internal error: {0}")]
  Internal(String),
}

impl MarketError {
  pub fn not_found(entity: &'static str, id: i64) -> Self {
    MarketError::NotFound { entity, id }
  }

  /// Whether this is a broken business rule (stock, balance, availability)
  /// rather than bad input or an infrastructure fault.
  pub fn is_business_rule(&self) -> bool {
    matches!(
      self,
      MarketError::InsufficientStock { .. }
        | MarketError::InsufficientBalance { .. }
        | MarketError::Unavailable { .. }
        | MarketError::EmptyCart
    )
  }
}

pub type Result<T, E = MarketError> = std::result::Result<T, E>;
