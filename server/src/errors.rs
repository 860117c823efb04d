// server/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use market::MarketError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error(transparent)]
  Market(#[from] MarketError),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl AppError {
  /// Message placed in the `error` field of the response body. Storage and
  /// internal details stay in the logs.
  fn public_message(&self) -> String {
    match self {
      AppError::Validation(m) | AppError::Auth(m) | AppError::Forbidden(m) => m.clone(),
      AppError::Market(MarketError::Database(_)) => "Database operation failed".to_string(),
      AppError::Market(MarketError::Pipeline(_)) | AppError::Market(MarketError::Internal(_)) => {
        "An internal error occurred".to_string()
      }
      AppError::Market(e) => e.to_string(),
      AppError::Config(_) | AppError::Internal(_) => "An internal error occurred".to_string(),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Forbidden(_) => StatusCode::FORBIDDEN,
      AppError::Market(e) => match e {
        MarketError::NotFound { .. } => StatusCode::NOT_FOUND,
        MarketError::Validation(_) => StatusCode::BAD_REQUEST,
        e if e.is_business_rule() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
      },
      AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::warn!(application_error = %self, status = status.as_u16(), "Request rejected");
    }
    HttpResponse::build(status).json(json!({ "error": self.public_message() }))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
