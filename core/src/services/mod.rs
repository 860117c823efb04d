// core/src/services/mod.rs

//! Marketplace use cases over a [`MarketStore`](crate::store::MarketStore).

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod ledger;

pub use cart::CartService;
pub use catalog::{CatalogService, ProductQuery};
pub use checkout::{build_checkout_pipeline, CheckoutCtxData, CheckoutReceipt, CheckoutService, PurchaseLine, PurchaseSource};
pub use ledger::LedgerService;
