// server/src/web/handlers/transaction_handlers.rs

use actix_web::{web, HttpResponse};
use market::PageRequest;
use serde_json::json;
use tracing::instrument;

use super::{pagination_json, PageQuery};
use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AdminUser;

#[instrument(name = "handler::list_transactions", skip(app_state, admin), fields(admin_id = admin.user_id()))]
pub async fn list_transactions_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
  let page = app_state
    .market
    .ledger
    .list_transactions(PageRequest::new(query.page, query.limit))
    .await?;

  let pagination = pagination_json(&page);
  Ok(HttpResponse::Ok().json(json!({
      "message": "Transactions fetched successfully.",
      "transactions": page.items,
      "pagination": pagination
  })))
}
