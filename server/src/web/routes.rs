// server/src/web/routes.rs

use actix_web::error::{JsonPayloadError, PathError, QueryPayloadError};
use actix_web::{web, HttpRequest, HttpResponse};

use crate::errors::AppError;
use crate::web::handlers::{cart_handlers, checkout_handlers, product_handlers, transaction_handlers};

async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
  AppError::Validation(format!("Invalid JSON payload: {}", err)).into()
}

fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
  AppError::Validation(format!("Invalid query parameters: {}", err)).into()
}

fn path_error_handler(err: PathError, _req: &HttpRequest) -> actix_web::Error {
  AppError::Validation(format!("Invalid path parameter: {}", err)).into()
}

// Called in `main.rs` to configure services for the Actix App.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(web::JsonConfig::default().error_handler(json_error_handler))
    .app_data(web::QueryConfig::default().error_handler(query_error_handler))
    .app_data(web::PathConfig::default().error_handler(path_error_handler))
    .service(
      web::scope("/api/v1")
        .route("/health", web::get().to(health_check_handler))
        .service(
          web::scope("/products")
            .route("", web::get().to(product_handlers::list_products_handler))
            .route("", web::post().to(product_handlers::create_product_handler))
            .route("/{product_id}", web::get().to(product_handlers::get_product_handler))
            .route("/{product_id}", web::put().to(product_handlers::update_product_handler))
            .route("/{product_id}", web::delete().to(product_handlers::delete_product_handler)),
        )
        .route("/purchase", web::post().to(checkout_handlers::purchase_handler))
        .route(
          "/transactions",
          web::get().to(transaction_handlers::list_transactions_handler),
        )
        .service(
          web::scope("/cart")
            .route("", web::get().to(cart_handlers::get_cart_handler))
            .route("", web::post().to(cart_handlers::add_to_cart_handler))
            .route("/checkout", web::post().to(checkout_handlers::checkout_cart_handler))
            .route("/{item_id}", web::put().to(cart_handlers::update_cart_item_handler))
            .route("/{item_id}", web::delete().to(cart_handlers::remove_cart_item_handler)),
        ),
    );
}
