// server/src/web/handlers/mod.rs

pub mod cart_handlers;
pub mod checkout_handlers;
pub mod product_handlers;
pub mod transaction_handlers;

use market::Page;
use serde::Deserialize;
use serde_json::{json, Value};

/// `?page=&limit=` query shared by the paginated listings.
#[derive(Deserialize, Debug, Default)]
pub struct PageQuery {
  pub page: Option<i64>,
  pub limit: Option<i64>,
}

pub(crate) fn pagination_json<T>(page: &Page<T>) -> Value {
  json!({
    "page": page.page,
    "limit": page.limit,
    "total": page.total,
    "total_pages": page.total_pages,
  })
}
