// server/src/web/handlers/product_handlers.rs

use actix_web::{web, HttpResponse};
use market::models::{NewProduct, ProductPatch, ProductStatus};
use market::{AuditAction, AuditEntity, AuditEntry, PageRequest, ProductQuery};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use super::pagination_json;
use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::{AdminUser, AuthenticatedUser, RequestMeta};

#[derive(Deserialize, Debug)]
pub struct ListProductsQuery {
  pub status: Option<ProductStatus>,
  pub page: Option<i64>,
  pub limit: Option<i64>,
}

#[instrument(name = "handler::list_products", skip(app_state, user), fields(user_id = user.user_id))]
pub async fn list_products_handler(
  app_state: web::Data<AppState>,
  user: AuthenticatedUser,
  query: web::Query<ListProductsQuery>,
) -> Result<HttpResponse, AppError> {
  let query = query.into_inner();
  let product_query = ProductQuery {
    status: query.status,
    page: PageRequest::new(query.page, query.limit),
  };
  let page = app_state.market.catalog.list_products(product_query, user.role).await?;
  info!(returned = page.items.len(), total = page.total, "Products listed.");

  let pagination = pagination_json(&page);
  Ok(HttpResponse::Ok().json(json!({
      "message": "Products fetched successfully.",
      "products": page.items,
      "pagination": pagination
  })))
}

#[instrument(name = "handler::get_product", skip(app_state, _user, path), fields(product_id = %path.as_ref()))]
pub async fn get_product_handler(
  app_state: web::Data<AppState>,
  _user: AuthenticatedUser,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let product = app_state.market.catalog.get_product(path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({
      "message": "Product fetched successfully.",
      "product": product
  })))
}

#[instrument(name = "handler::create_product", skip(app_state, admin, meta, payload), fields(admin_id = admin.user_id()))]
pub async fn create_product_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  meta: RequestMeta,
  payload: web::Json<NewProduct>,
) -> Result<HttpResponse, AppError> {
  let product = app_state.market.catalog.create_product(payload.into_inner()).await?;

  app_state.record_audit(
    AuditEntry::new(
      admin.user_id(),
      AuditAction::CreateProduct,
      AuditEntity::Product,
      product.id,
      format!("Created product '{}' priced at {} points", product.name, product.price),
    )
    .with_client(meta.ip_address, meta.user_agent),
  );

  Ok(HttpResponse::Created().json(json!({
      "message": "Product created successfully.",
      "product": product
  })))
}

#[instrument(name = "handler::update_product", skip(app_state, admin, meta, path, payload), fields(admin_id = admin.user_id(), product_id = %path.as_ref()))]
pub async fn update_product_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  meta: RequestMeta,
  path: web::Path<i64>,
  payload: web::Json<ProductPatch>,
) -> Result<HttpResponse, AppError> {
  let product = app_state
    .market
    .catalog
    .update_product(path.into_inner(), payload.into_inner())
    .await?;

  app_state.record_audit(
    AuditEntry::new(
      admin.user_id(),
      AuditAction::UpdateProduct,
      AuditEntity::Product,
      product.id,
      format!("Updated product '{}'", product.name),
    )
    .with_client(meta.ip_address, meta.user_agent),
  );

  Ok(HttpResponse::Ok().json(json!({
      "message": "Product updated successfully.",
      "product": product
  })))
}

#[instrument(name = "handler::delete_product", skip(app_state, admin, meta, path), fields(admin_id = admin.user_id(), product_id = %path.as_ref()))]
pub async fn delete_product_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  meta: RequestMeta,
  path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();
  app_state.market.catalog.delete_product(product_id).await?;

  app_state.record_audit(
    AuditEntry::new(
      admin.user_id(),
      AuditAction::DeleteProduct,
      AuditEntity::Product,
      product_id,
      "Product deactivated",
    )
    .with_client(meta.ip_address, meta.user_agent),
  );

  Ok(HttpResponse::Ok().json(json!({
      "message": "Product deleted successfully."
  })))
}
