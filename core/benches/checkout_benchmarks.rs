use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use market::models::NewProduct;
use market::{ContextData, InMemoryMarketStore, ListingPolicy, MarketStore, Marketplace, Pipeline, PipelineControl, PipelineError};
use std::sync::Arc;
use tokio::runtime::Runtime;

#[derive(Clone, Debug, Default)]
struct BenchContext {
  counter: u64,
}

type BenchError = PipelineError;

fn create_sync_increment_handler() -> market::pipeline::Handler<BenchContext, BenchError> {
  Box::new(move |ctx: ContextData<BenchContext>| {
    Box::pin(async move {
      ctx.write().counter += 1;
      Ok(PipelineControl::Continue)
    })
  })
}

/// Bare pipeline dispatch cost, independent of any store.
fn bench_pipeline_dispatch(c: &mut Criterion) {
  let mut group = c.benchmark_group("PipelineDispatch");
  let rt = Runtime::new().unwrap();

  for num_steps in [1usize, 5, 10].iter() {
    let step_defs: Vec<(&str, bool, Option<market::pipeline::SkipCondition<BenchContext>>)> = (0..*num_steps)
      .map(|i| (Box::leak(format!("step_{}", i).into_boxed_str()) as &'static str, false, None))
      .collect();

    let mut pipeline = Pipeline::<BenchContext, BenchError>::new(&step_defs);
    for i in 0..*num_steps {
      pipeline.on_root(&format!("step_{}", i), create_sync_increment_handler());
    }
    let pipeline = Arc::new(pipeline);

    group.throughput(Throughput::Elements(*num_steps as u64));
    group.bench_with_input(BenchmarkId::from_parameter(num_steps), num_steps, |b, _| {
      b.to_async(&rt).iter_batched(
        || ContextData::new(BenchContext::default()),
        |ctx| {
          let p = pipeline.clone();
          async move { p.run(ctx).await.unwrap() }
        },
        criterion::BatchSize::SmallInput,
      );
    });
  }
  group.finish();
}

async fn seeded_market(lines: usize) -> (InMemoryMarketStore, Marketplace, Vec<i64>) {
  let store = InMemoryMarketStore::new();
  store.insert_wallet(1, i64::MAX / 2).await;
  let mut product_ids = Vec::with_capacity(lines);
  for i in 0..lines {
    let product = store
      .insert_product(&NewProduct {
        name: format!("Bench Item {}", i),
        description: String::new(),
        price: 1,
        stock: i32::MAX,
        status: None,
      })
      .await
      .unwrap();
    product_ids.push(product.id);
  }
  let market = Marketplace::new(Arc::new(store.clone()), ListingPolicy::default());
  (store, market, product_ids)
}

fn bench_direct_purchase(c: &mut Criterion) {
  let rt = Runtime::new().unwrap();
  let (_store, market, product_ids) = rt.block_on(seeded_market(1));
  let market = Arc::new(market);
  let product_id = product_ids[0];

  c.bench_function("DirectPurchase/in_memory", |b| {
    b.to_async(&rt).iter(|| {
      let m = market.clone();
      async move { m.checkout.purchase(1, product_id, 1).await.unwrap() }
    });
  });
}

fn bench_cart_checkout(c: &mut Criterion) {
  let mut group = c.benchmark_group("CartCheckout");
  let rt = Runtime::new().unwrap();

  for lines in [1usize, 5, 20].iter() {
    let (_store, market, product_ids) = rt.block_on(seeded_market(*lines));
    let market = Arc::new(market);

    group.throughput(Throughput::Elements(*lines as u64));
    group.bench_with_input(BenchmarkId::from_parameter(lines), lines, |b, _| {
      b.to_async(&rt).iter(|| {
        let m = market.clone();
        let ids = product_ids.clone();
        async move {
          for id in ids {
            m.cart.add_item(1, id, 1).await.unwrap();
          }
          m.checkout.checkout_cart(1, None).await.unwrap()
        }
      });
    });
  }
  group.finish();
}

criterion_group!(benches, bench_pipeline_dispatch, bench_direct_purchase, bench_cart_checkout);
criterion_main!(benches);
