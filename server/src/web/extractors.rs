// server/src/web/extractors.rs

//! Request identity and client metadata.
//!
//! Authentication happens upstream; the marketplace trusts the caller
//! identity forwarded in `X-User-ID` and `X-User-Role`.

use actix_web::dev::Payload;
use actix_web::http::header::USER_AGENT;
use actix_web::{FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use market::Role;
use tracing::warn;

use crate::errors::AppError;

pub const USER_ID_HEADER: &str = "X-User-ID";
pub const USER_ROLE_HEADER: &str = "X-User-Role";

#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
  pub user_id: i64,
  pub role: Role,
}

impl AuthenticatedUser {
  fn from_headers(req: &HttpRequest) -> Result<Self, AppError> {
    let user_id = req
      .headers()
      .get(USER_ID_HEADER)
      .and_then(|v| v.to_str().ok())
      .and_then(|v| v.trim().parse::<i64>().ok())
      .ok_or_else(|| {
        warn!("AuthenticatedUser extractor: Missing or invalid X-User-ID header.");
        AppError::Auth("User authentication required. Missing or invalid X-User-ID header.".to_string())
      })?;

    let role = match req.headers().get(USER_ROLE_HEADER) {
      None => Role::Student,
      Some(value) => value
        .to_str()
        .ok()
        .and_then(|v| v.parse::<Role>().ok())
        .ok_or_else(|| AppError::Auth("Invalid X-User-Role header.".to_string()))?,
    };

    Ok(Self { user_id, role })
  }
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    ready(Self::from_headers(req))
  }
}

/// An [`AuthenticatedUser`] holding the admin role.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser(pub AuthenticatedUser);

impl AdminUser {
  pub fn user_id(&self) -> i64 {
    self.0.user_id
  }
}

impl FromRequest for AdminUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    ready(AuthenticatedUser::from_headers(req).and_then(|user| {
      if user.role.is_admin() {
        Ok(AdminUser(user))
      } else {
        warn!(user_id = user.user_id, "Non-admin caller on admin endpoint.");
        Err(AppError::Forbidden("Administrator role required.".to_string()))
      }
    }))
  }
}

/// Client address and user agent, recorded with audit entries.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
  pub ip_address: Option<String>,
  pub user_agent: Option<String>,
}

impl FromRequest for RequestMeta {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let ip_address = req.connection_info().realip_remote_addr().map(str::to_string);
    let user_agent = req
      .headers()
      .get(USER_AGENT)
      .and_then(|v| v.to_str().ok())
      .map(str::to_string);
    ready(Ok(RequestMeta { ip_address, user_agent }))
  }
}
