// tests/common/mod.rs
#![allow(dead_code)]

use market::models::{NewProduct, Product, ProductStatus, Wallet};
use market::{ContextData, InMemoryMarketStore, ListingPolicy, MarketStore, Marketplace, PipelineControl, PipelineError};
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::Level;

// --- Pipeline test context ---
#[derive(Clone, Debug, Default)]
pub struct TestContext {
  pub counter: i32,
  pub message: String,
  pub steps_executed: Vec<String>,
  pub should_stop_at: Option<String>,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("pipeline error: {0}")]
  Pipeline(String),

  #[error("handler failed: {0}")]
  Handler(String),
}

impl From<PipelineError> for TestError {
  fn from(pe: PipelineError) -> Self {
    TestError::Pipeline(format!("{:?}", pe))
  }
}

pub fn create_simple_handler(step_name: &'static str, message_to_append: &'static str) -> market::pipeline::Handler<TestContext, TestError> {
  Box::new(move |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.counter += 1;
      guard.message.push_str(message_to_append);
      guard.steps_executed.push(step_name.to_string());
      if guard.should_stop_at.as_deref() == Some(step_name) {
        return Ok(PipelineControl::Stop);
      }
      Ok(PipelineControl::Continue)
    })
  })
}

pub fn create_failing_handler(step_name: &'static str, error_message: &'static str) -> market::pipeline::Handler<TestContext, TestError> {
  Box::new(move |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      ctx.write().steps_executed.push(step_name.to_string());
      Err(TestError::Handler(error_message.to_string()))
    })
  })
}

// --- Tracing ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Marketplace fixtures ---
pub struct TestMarket {
  pub store: InMemoryMarketStore,
  pub market: Marketplace,
}

pub fn test_market() -> TestMarket {
  setup_tracing();
  let store = InMemoryMarketStore::new();
  let market = Marketplace::new(Arc::new(store.clone()), ListingPolicy::default());
  TestMarket { store, market }
}

pub fn new_product(name: &str, price: i64, stock: i32) -> NewProduct {
  NewProduct {
    name: name.to_string(),
    description: format!("{} description", name),
    price,
    stock,
    status: None,
  }
}

pub async fn seed_product(store: &InMemoryMarketStore, name: &str, price: i64, stock: i32) -> Product {
  store.insert_product(&new_product(name, price, stock)).await.unwrap()
}

pub async fn seed_inactive_product(store: &InMemoryMarketStore, name: &str, price: i64, stock: i32) -> Product {
  let mut new = new_product(name, price, stock);
  new.status = Some(ProductStatus::Inactive);
  store.insert_product(&new).await.unwrap()
}

pub async fn seed_student(store: &InMemoryMarketStore, user_id: i64, balance: i64) -> Wallet {
  store
    .insert_user(user_id, &format!("Student {}", user_id), &format!("student{}@campus.test", user_id))
    .await;
  store.insert_wallet(user_id, balance).await
}

pub async fn product_stock(store: &InMemoryMarketStore, id: i64) -> i32 {
  store.find_product(id).await.unwrap().unwrap().stock
}

pub async fn balance_of(store: &InMemoryMarketStore, user_id: i64) -> i64 {
  store.wallet_for_user(user_id).await.unwrap().balance
}
