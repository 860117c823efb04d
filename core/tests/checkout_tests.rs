// tests/checkout_tests.rs
mod common;

use common::*;
use market::MarketError;

#[tokio::test]
async fn direct_purchase_debits_wallet_and_stock() {
  let t = test_market();
  seed_student(&t.store, 1, 100).await;
  let product = seed_product(&t.store, "Tote Bag", 30, 5).await;

  let receipt = t.market.checkout.purchase(1, product.id, 2).await.unwrap();

  assert_eq!(receipt.total_points, 60);
  assert_eq!(receipt.remaining_balance, 40);
  assert_eq!(receipt.transactions.len(), 1);
  assert_eq!(receipt.transactions[0].total_amount, 60);
  assert_eq!(receipt.transactions[0].quantity, 2);
  assert_eq!(receipt.transactions[0].reference, receipt.reference);

  assert_eq!(balance_of(&t.store, 1).await, 40);
  assert_eq!(product_stock(&t.store, product.id).await, 3);
  assert_eq!(t.store.transactions().await.len(), 1);
}

#[tokio::test]
async fn direct_purchase_leaves_cart_alone() {
  let t = test_market();
  seed_student(&t.store, 1, 100).await;
  let product = seed_product(&t.store, "Tote Bag", 30, 5).await;
  t.market.cart.add_item(1, product.id, 1).await.unwrap();

  t.market.checkout.purchase(1, product.id, 1).await.unwrap();

  assert_eq!(t.market.cart.get_cart(1).await.unwrap().items.len(), 1);
}

#[tokio::test]
async fn cart_checkout_buys_everything_and_clears_the_cart() {
  let t = test_market();
  let wallet = seed_student(&t.store, 1, 100).await;
  let bag = seed_product(&t.store, "Tote Bag", 30, 5).await;
  let pin = seed_product(&t.store, "Pin", 5, 10).await;
  t.market.cart.add_item(1, bag.id, 2).await.unwrap();
  t.market.cart.add_item(1, pin.id, 3).await.unwrap();

  let receipt = t.market.checkout.checkout_cart(1, None).await.unwrap();

  assert_eq!(receipt.wallet_id, wallet.id);
  assert_eq!(receipt.total_points, 75);
  assert_eq!(receipt.remaining_balance, 25);
  assert_eq!(receipt.transactions.len(), 2);
  assert!(receipt.transactions.iter().all(|r| r.reference == receipt.reference));

  assert_eq!(product_stock(&t.store, bag.id).await, 3);
  assert_eq!(product_stock(&t.store, pin.id).await, 7);
  assert!(t.market.cart.get_cart(1).await.unwrap().items.is_empty());
}

#[tokio::test]
async fn selected_checkout_keeps_unselected_rows() {
  let t = test_market();
  seed_student(&t.store, 1, 100).await;
  let bag = seed_product(&t.store, "Tote Bag", 30, 5).await;
  let pin = seed_product(&t.store, "Pin", 5, 10).await;
  let bag_row = t.market.cart.add_item(1, bag.id, 1).await.unwrap();
  t.market.cart.add_item(1, pin.id, 1).await.unwrap();

  let receipt = t.market.checkout.checkout_cart(1, Some(vec![bag_row.id])).await.unwrap();

  assert_eq!(receipt.total_points, 30);
  let cart = t.market.cart.get_cart(1).await.unwrap();
  assert_eq!(cart.items.len(), 1);
  assert_eq!(cart.items[0].product_id, pin.id);
}

#[tokio::test]
async fn insufficient_balance_changes_nothing() {
  let t = test_market();
  seed_student(&t.store, 1, 50).await;
  let bag = seed_product(&t.store, "Tote Bag", 30, 5).await;
  t.market.cart.add_item(1, bag.id, 2).await.unwrap();

  let err = t.market.checkout.checkout_cart(1, None).await.unwrap_err();

  assert!(matches!(
    err,
    MarketError::InsufficientBalance {
      required: 60,
      available: 50
    }
  ));
  assert_eq!(balance_of(&t.store, 1).await, 50);
  assert_eq!(product_stock(&t.store, bag.id).await, 5);
  assert!(t.store.transactions().await.is_empty());
  assert_eq!(t.market.cart.get_cart(1).await.unwrap().items.len(), 1);
}

#[tokio::test]
async fn one_short_line_fails_the_whole_checkout() {
  let t = test_market();
  seed_student(&t.store, 1, 1_000).await;
  let bag = seed_product(&t.store, "Tote Bag", 30, 5).await;
  let pin = seed_product(&t.store, "Pin", 5, 10).await;
  t.market.cart.add_item(1, bag.id, 1).await.unwrap();
  t.market.cart.add_item(1, pin.id, 4).await.unwrap();

  // Stock drops after the item went into the cart.
  t.market
    .catalog
    .update_product(
      pin.id,
      market::models::ProductPatch {
        stock: Some(2),
        ..Default::default()
      },
    )
    .await
    .unwrap();

  let err = t.market.checkout.checkout_cart(1, None).await.unwrap_err();
  assert!(matches!(
    err,
    MarketError::InsufficientStock {
      requested: 4,
      available: 2,
      ..
    }
  ));
  assert_eq!(balance_of(&t.store, 1).await, 1_000);
  assert_eq!(product_stock(&t.store, bag.id).await, 5);
  assert_eq!(t.market.cart.get_cart(1).await.unwrap().items.len(), 2);
}

#[tokio::test]
async fn deactivated_product_in_cart_blocks_checkout() {
  let t = test_market();
  seed_student(&t.store, 1, 1_000).await;
  let bag = seed_product(&t.store, "Tote Bag", 30, 5).await;
  t.market.cart.add_item(1, bag.id, 1).await.unwrap();
  t.market.catalog.delete_product(bag.id).await.unwrap();

  let err = t.market.checkout.checkout_cart(1, None).await.unwrap_err();
  assert!(matches!(err, MarketError::Unavailable { product_id } if product_id == bag.id));
  assert_eq!(balance_of(&t.store, 1).await, 1_000);
}

#[tokio::test]
async fn empty_cart_is_rejected() {
  let t = test_market();
  seed_student(&t.store, 1, 100).await;

  let err = t.market.checkout.checkout_cart(1, None).await.unwrap_err();
  assert!(matches!(err, MarketError::EmptyCart));
  assert!(err.is_business_rule());
}

#[tokio::test]
async fn unknown_selected_row_is_not_found() {
  let t = test_market();
  seed_student(&t.store, 1, 100).await;
  let bag = seed_product(&t.store, "Tote Bag", 30, 5).await;
  let row = t.market.cart.add_item(1, bag.id, 1).await.unwrap();

  let err = t
    .market
    .checkout
    .checkout_cart(1, Some(vec![row.id, 9_999]))
    .await
    .unwrap_err();
  assert!(matches!(err, MarketError::NotFound { entity: "cart item", id: 9_999 }));
  assert_eq!(balance_of(&t.store, 1).await, 100);
}

#[tokio::test]
async fn other_users_rows_cannot_be_selected() {
  let t = test_market();
  seed_student(&t.store, 1, 100).await;
  seed_student(&t.store, 2, 100).await;
  let bag = seed_product(&t.store, "Tote Bag", 30, 5).await;
  let foreign = t.market.cart.add_item(2, bag.id, 1).await.unwrap();

  let err = t.market.checkout.checkout_cart(1, Some(vec![foreign.id])).await.unwrap_err();
  assert!(matches!(err, MarketError::NotFound { .. }));
  assert_eq!(t.market.cart.get_cart(2).await.unwrap().items.len(), 1);
}

#[tokio::test]
async fn purchase_rejects_bad_input() {
  let t = test_market();
  seed_student(&t.store, 1, 100).await;
  let bag = seed_product(&t.store, "Tote Bag", 30, 5).await;
  let retired = seed_inactive_product(&t.store, "Retired", 10, 5).await;

  assert!(matches!(
    t.market.checkout.purchase(1, bag.id, 0).await,
    Err(MarketError::Validation(_))
  ));
  assert!(matches!(
    t.market.checkout.purchase(1, 4_040, 1).await,
    Err(MarketError::NotFound { entity: "product", .. })
  ));
  assert!(matches!(
    t.market.checkout.purchase(1, retired.id, 1).await,
    Err(MarketError::Unavailable { .. })
  ));
  assert!(matches!(
    t.market.checkout.purchase(1, bag.id, 6).await,
    Err(MarketError::InsufficientStock { .. })
  ));
  assert_eq!(balance_of(&t.store, 1).await, 100);
}

#[tokio::test]
async fn buyer_without_wallet_is_not_found() {
  let t = test_market();
  let bag = seed_product(&t.store, "Tote Bag", 30, 5).await;

  let err = t.market.checkout.purchase(42, bag.id, 1).await.unwrap_err();
  assert!(matches!(err, MarketError::NotFound { id: 42, .. }));
  assert_eq!(product_stock(&t.store, bag.id).await, 5);
}

#[tokio::test]
async fn oversized_totals_are_rejected() {
  let t = test_market();
  seed_student(&t.store, 1, i64::MAX).await;
  let gold = seed_product(&t.store, "Gold Bar", i64::MAX, 5).await;

  let err = t.market.checkout.purchase(1, gold.id, 2).await.unwrap_err();
  assert!(matches!(err, MarketError::Validation(_)));
  assert_eq!(product_stock(&t.store, gold.id).await, 5);
}

#[tokio::test]
async fn exact_balance_can_be_spent() {
  let t = test_market();
  seed_student(&t.store, 1, 60).await;
  let bag = seed_product(&t.store, "Tote Bag", 30, 2).await;

  let receipt = t.market.checkout.purchase(1, bag.id, 2).await.unwrap();
  assert_eq!(receipt.remaining_balance, 0);
  assert_eq!(product_stock(&t.store, bag.id).await, 0);
}

#[tokio::test]
async fn concurrent_buyers_cannot_oversell() {
  let t = test_market();
  seed_student(&t.store, 1, 100).await;
  seed_student(&t.store, 2, 100).await;
  let last = seed_product(&t.store, "Last One", 10, 1).await;

  let (a, b) = tokio::join!(
    t.market.checkout.purchase(1, last.id, 1),
    t.market.checkout.purchase(2, last.id, 1)
  );

  assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
  let loser = if a.is_ok() { b } else { a };
  assert!(matches!(loser, Err(MarketError::InsufficientStock { available: 0, .. })));
  assert_eq!(product_stock(&t.store, last.id).await, 0);
  assert_eq!(t.store.transactions().await.len(), 1);
}

#[tokio::test]
async fn concurrent_purchases_cannot_overdraw_one_wallet() {
  let t = test_market();
  seed_student(&t.store, 1, 50).await;
  let bag = seed_product(&t.store, "Tote Bag", 30, 10).await;
  let mug = seed_product(&t.store, "Mug", 30, 10).await;

  let (a, b) = tokio::join!(
    t.market.checkout.purchase(1, bag.id, 1),
    t.market.checkout.purchase(1, mug.id, 1)
  );

  assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
  let loser = if a.is_ok() { b } else { a };
  assert!(matches!(
    loser,
    Err(MarketError::InsufficientBalance {
      required: 30,
      available: 20
    })
  ));
  assert_eq!(balance_of(&t.store, 1).await, 20);
  assert_eq!(t.store.transactions().await.len(), 1);
  assert_eq!(
    product_stock(&t.store, bag.id).await + product_stock(&t.store, mug.id).await,
    19
  );
}
