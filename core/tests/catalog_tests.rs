// tests/catalog_tests.rs
mod common;

use common::*;
use market::models::{ProductPatch, ProductStatus};
use market::{MarketError, PageRequest, ProductQuery, Role};

#[tokio::test]
async fn create_then_get_product() {
  let t = test_market();
  let created = t.market.catalog.create_product(new_product("Notebook", 15, 10)).await.unwrap();

  assert_eq!(created.status, ProductStatus::Active);
  let fetched = t.market.catalog.get_product(created.id).await.unwrap();
  assert_eq!(fetched, created);
}

#[tokio::test]
async fn create_rejects_invalid_input() {
  let t = test_market();

  let blank = t.market.catalog.create_product(new_product("   ", 10, 1)).await;
  assert!(matches!(blank, Err(MarketError::Validation(_))));

  let free = t.market.catalog.create_product(new_product("Pen", 0, 1)).await;
  assert!(matches!(free, Err(MarketError::Validation(_))));

  let negative_stock = t.market.catalog.create_product(new_product("Pen", 5, -1)).await;
  assert!(matches!(negative_stock, Err(MarketError::Validation(_))));

  let (_, total) = market::MarketStore::list_products(&t.store, None, PageRequest::default())
    .await
    .unwrap();
  assert_eq!(total, 0);
}

#[tokio::test]
async fn get_unknown_product_is_not_found() {
  let t = test_market();
  let err = t.market.catalog.get_product(999).await.unwrap_err();
  assert!(matches!(err, MarketError::NotFound { entity: "product", id: 999 }));
}

#[tokio::test]
async fn students_only_see_active_products() {
  let t = test_market();
  seed_product(&t.store, "Mug", 20, 3).await;
  seed_inactive_product(&t.store, "Old Mug", 20, 3).await;

  let query = ProductQuery {
    status: Some(ProductStatus::Inactive),
    ..ProductQuery::default()
  };
  let student_view = t.market.catalog.list_products(query, Role::Student).await.unwrap();
  assert_eq!(student_view.total, 1);
  assert!(student_view.items.iter().all(|p| p.status == ProductStatus::Active));

  let admin_view = t.market.catalog.list_products(query, Role::Admin).await.unwrap();
  assert_eq!(admin_view.total, 1);
  assert_eq!(admin_view.items[0].name, "Old Mug");

  let admin_all = t
    .market
    .catalog
    .list_products(ProductQuery::default(), Role::Admin)
    .await
    .unwrap();
  assert_eq!(admin_all.total, 2);
}

#[tokio::test]
async fn listing_pages_newest_first() {
  let t = test_market();
  let mut ids = Vec::new();
  for i in 1..=25 {
    ids.push(seed_product(&t.store, &format!("Item {}", i), 10, 1).await.id);
  }
  ids.reverse();

  let query = ProductQuery {
    status: None,
    page: PageRequest::new(Some(2), Some(10)),
  };
  let page = t.market.catalog.list_products(query, Role::Admin).await.unwrap();

  assert_eq!(page.total, 25);
  assert_eq!(page.total_pages, 3);
  assert_eq!(page.page, 2);
  assert_eq!(page.limit, 10);
  let got: Vec<i64> = page.items.iter().map(|p| p.id).collect();
  assert_eq!(got, ids[10..20].to_vec());
}

#[tokio::test]
async fn update_applies_only_given_fields() {
  let t = test_market();
  let product = seed_product(&t.store, "Sticker", 5, 100).await;

  let patch = ProductPatch {
    price: Some(7),
    ..ProductPatch::default()
  };
  let updated = t.market.catalog.update_product(product.id, patch).await.unwrap();

  assert_eq!(updated.price, 7);
  assert_eq!(updated.name, "Sticker");
  assert_eq!(updated.stock, 100);
}

#[tokio::test]
async fn update_rejects_empty_or_invalid_patch() {
  let t = test_market();
  let product = seed_product(&t.store, "Sticker", 5, 100).await;

  let empty = t.market.catalog.update_product(product.id, ProductPatch::default()).await;
  assert!(matches!(empty, Err(MarketError::Validation(_))));

  let bad_price = ProductPatch {
    price: Some(-3),
    ..ProductPatch::default()
  };
  assert!(matches!(
    t.market.catalog.update_product(product.id, bad_price).await,
    Err(MarketError::Validation(_))
  ));

  let unknown = ProductPatch {
    stock: Some(1),
    ..ProductPatch::default()
  };
  assert!(matches!(
    t.market.catalog.update_product(4242, unknown).await,
    Err(MarketError::NotFound { .. })
  ));
}

#[tokio::test]
async fn delete_is_a_soft_delete() {
  let t = test_market();
  let product = seed_product(&t.store, "Lanyard", 12, 4).await;

  t.market.catalog.delete_product(product.id).await.unwrap();

  let still_there = t.market.catalog.get_product(product.id).await.unwrap();
  assert_eq!(still_there.status, ProductStatus::Inactive);

  let listing = t
    .market
    .catalog
    .list_products(ProductQuery::default(), Role::Student)
    .await
    .unwrap();
  assert_eq!(listing.total, 0);

  assert!(matches!(
    t.market.catalog.delete_product(31337).await,
    Err(MarketError::NotFound { .. })
  ));
}
