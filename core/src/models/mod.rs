// core/src/models/mod.rs

//! Data structures for marketplace tables and the payloads that create or change them.

pub mod cart_item;
pub mod product;
pub mod transaction;
pub mod wallet;

pub use cart_item::{CartItem, CartLine, CartView};
pub use product::{NewProduct, Product, ProductPatch, ProductStatus};
pub use transaction::{MarketplaceTransaction, NewLedgerEntry, TransactionDetails};
pub use wallet::Wallet;
