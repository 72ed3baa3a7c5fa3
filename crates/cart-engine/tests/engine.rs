//! Integration tests for the cart engine: identity/merge behavior, price
//! exactness, the observer stream, and the concurrency contract.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use cart_engine::{
    CartEngine, CartError, CartResult, EngineConfig, ItemRequest, Money, PriceSource,
    SubItemPrice, SubItemRequest,
};

// =============================================================================
// Test Price Sources
// =============================================================================

/// Price source backed by fixed maps, with a lookup counter and an optional
/// artificial delay to widen race windows.
struct StubSource {
    /// Simple prices keyed by "id" or "id:variant".
    simple: HashMap<String, f64>,
    /// Bundle sub-item prices keyed by sub_id.
    subs: HashMap<String, f64>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StubSource {
    fn new(prices: &[(&str, f64)]) -> Self {
        StubSource {
            simple: prices
                .iter()
                .map(|(id, p)| (id.to_string(), *p))
                .collect(),
            subs: HashMap::new(),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    fn with_subs(mut self, prices: &[(&str, f64)]) -> Self {
        self.subs = prices
            .iter()
            .map(|(id, p)| (id.to_string(), *p))
            .collect();
        self
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl PriceSource for StubSource {
    async fn resolve_simple(&self, id: &str, variant: Option<&str>) -> CartResult<Option<f64>> {
        self.simulate_latency().await;
        let key = match variant {
            Some(v) => format!("{id}:{v}"),
            None => id.to_string(),
        };
        Ok(self.simple.get(&key).copied())
    }

    async fn resolve_bundle(
        &self,
        _id: &str,
        sub_items: &[SubItemRequest],
    ) -> CartResult<Vec<SubItemPrice>> {
        self.simulate_latency().await;
        Ok(sub_items
            .iter()
            .filter_map(|s| {
                self.subs.get(&s.sub_id).map(|&price| SubItemPrice {
                    sub_id: s.sub_id.clone(),
                    price,
                })
            })
            .collect())
    }
}

/// Price source that always fails, to verify error passthrough.
struct FailingSource;

#[async_trait]
impl PriceSource for FailingSource {
    async fn resolve_simple(&self, _id: &str, _variant: Option<&str>) -> CartResult<Option<f64>> {
        Err(CartError::price_source("connection reset by peer"))
    }

    async fn resolve_bundle(
        &self,
        _id: &str,
        _sub_items: &[SubItemRequest],
    ) -> CartResult<Vec<SubItemPrice>> {
        Err(CartError::price_source("connection reset by peer"))
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

fn engine_with(
    prices: &[(&str, f64)],
) -> (CartEngine<Arc<StubSource>>, Arc<StubSource>) {
    init_tracing();
    let source = Arc::new(StubSource::new(prices));
    let engine = CartEngine::new(Arc::clone(&source), EngineConfig::default());
    (engine, source)
}

fn minor(m: i64) -> Money {
    Money::from_minor_units(m)
}

// =============================================================================
// Identity & Merge
// =============================================================================

#[tokio::test]
async fn add_twice_merges_into_one_entry() {
    let (engine, _) = engine_with(&[("tea", 1.75)]);
    let req = ItemRequest::simple("tea");

    engine.add(&req, 2).await.unwrap();
    let snap = engine.add(&req, 3).await.unwrap();

    assert_eq!(snap.line_count(), 1);
    assert_eq!(snap.quantity_of(&req.key()), 5);
    assert_eq!(snap.total(), minor(875)); // 175 * 5, never two entries
}

#[tokio::test]
async fn different_variants_are_different_lines() {
    let (engine, _) = engine_with(&[("tea:green", 1.50), ("tea:black", 1.00)]);

    engine
        .add(&ItemRequest::simple_variant("tea", "green"), 1)
        .await
        .unwrap();
    let snap = engine
        .add(&ItemRequest::simple_variant("tea", "black"), 1)
        .await
        .unwrap();

    assert_eq!(snap.line_count(), 2);
    assert_eq!(snap.total(), minor(250));
}

#[tokio::test]
async fn cache_hit_skips_price_lookup() {
    let (engine, source) = engine_with(&[("tea", 1.75)]);
    let req = ItemRequest::simple("tea");

    engine.add(&req, 1).await.unwrap();
    assert_eq!(source.calls(), 1);

    engine.add(&req, 1).await.unwrap();
    engine.add(&req, 5).await.unwrap();
    assert_eq!(source.calls(), 1); // still just the first lookup
}

#[tokio::test]
async fn count_for_answers_from_snapshot() {
    let (engine, _) = engine_with(&[("tea", 1.75)]);
    let req = ItemRequest::simple("tea");

    assert_eq!(engine.count_for(&req), 0);
    engine.add(&req, 4).await.unwrap();
    assert_eq!(engine.count_for(&req), 4);
    assert_eq!(engine.count_for(&ItemRequest::simple("coffee")), 0);
}

// =============================================================================
// Removal
// =============================================================================

#[tokio::test]
async fn subtract_to_zero_removes_entry() {
    let (engine, _) = engine_with(&[("tea", 1.75)]);
    let req = ItemRequest::simple("tea");

    engine.add(&req, 2).await.unwrap();
    let snap = engine.remove(&req, 2).unwrap();

    assert!(snap.is_empty());
    assert_eq!(snap.total(), Money::zero());
}

#[tokio::test]
async fn subtract_below_zero_removes_entirely() {
    let (engine, _) = engine_with(&[("tea", 1.75)]);
    let req = ItemRequest::simple("tea");

    engine.add(&req, 2).await.unwrap();
    let snap = engine.remove(&req, 10).unwrap();

    assert!(snap.is_empty());
}

#[tokio::test]
async fn remove_on_empty_cart_is_a_noop() {
    let (engine, _) = engine_with(&[]);
    let before = engine.snapshot();

    let snap = engine.remove(&ItemRequest::simple("tea"), 1).unwrap();

    assert_eq!(snap, before);
    assert!(snap.is_empty());
}

#[tokio::test]
async fn partial_remove_keeps_price_invariant() {
    let (engine, _) = engine_with(&[("tea", 2.50)]);
    let req = ItemRequest::simple("tea");

    engine.add(&req, 5).await.unwrap();
    let snap = engine.remove(&req, 2).unwrap();

    assert_eq!(snap.quantity_of(&req.key()), 3);
    assert_eq!(snap.total(), minor(750));
}

#[tokio::test]
async fn clear_resets_to_empty() {
    let (engine, _) = engine_with(&[("tea", 1.75), ("coffee", 2.50)]);

    engine.add(&ItemRequest::simple("tea"), 1).await.unwrap();
    engine.add(&ItemRequest::simple("coffee"), 2).await.unwrap();

    let snap = engine.clear();
    assert!(snap.is_empty());
    assert_eq!(engine.current_price(), Money::zero());
}

// =============================================================================
// Validation & Error Propagation
// =============================================================================

#[tokio::test]
async fn invalid_quantity_rejected_before_anything_else() {
    let (engine, source) = engine_with(&[("tea", 1.75)]);
    let req = ItemRequest::simple("tea");
    let before = engine.snapshot();

    let add_err = engine.add(&req, 0).await.unwrap_err();
    assert!(matches!(add_err, CartError::InvalidQuantity { requested: 0 }));

    let remove_err = engine.remove(&req, -3).unwrap_err();
    assert!(matches!(
        remove_err,
        CartError::InvalidQuantity { requested: -3 }
    ));

    assert_eq!(engine.snapshot(), before);
    assert_eq!(source.calls(), 0); // the source was never consulted
}

#[tokio::test]
async fn unknown_simple_item_is_product_not_found() {
    let (engine, _) = engine_with(&[("tea", 1.75)]);

    let err = engine
        .add(&ItemRequest::simple("unobtainium"), 1)
        .await
        .unwrap_err();

    assert!(matches!(err, CartError::ProductNotFound { ref id } if id == "unobtainium"));
    assert!(engine.snapshot().is_empty());
}

#[tokio::test]
async fn source_failure_propagates_and_leaves_snapshot_unchanged() {
    init_tracing();
    let engine = CartEngine::new(FailingSource, EngineConfig::default());

    let err = engine
        .add(&ItemRequest::simple("tea"), 1)
        .await
        .unwrap_err();

    assert!(matches!(err, CartError::PriceSource(_)));
    assert!(engine.snapshot().is_empty());
}

// =============================================================================
// Bundles
// =============================================================================

fn sub(id: &str, qty: i64) -> SubItemRequest {
    SubItemRequest {
        sub_id: id.to_string(),
        sub_variant: None,
        quantity: qty,
    }
}

#[tokio::test]
async fn bundle_price_sums_priced_sub_items() {
    init_tracing();
    let source = Arc::new(
        StubSource::new(&[]).with_subs(&[("burger", 5.00), ("fries", 2.50)]),
    );
    let engine = CartEngine::new(Arc::clone(&source), EngineConfig::default());

    let req = ItemRequest::bundle("menu", vec![sub("burger", 1), sub("fries", 2)]);
    let snap = engine.add(&req, 1).await.unwrap();

    // 500 + 2*250, converted to minor units before weighting
    assert_eq!(snap.total(), minor(1000));
}

#[tokio::test]
async fn bundle_tolerates_unpriced_sub_items() {
    init_tracing();
    let source = Arc::new(StubSource::new(&[]).with_subs(&[("burger", 5.00)]));
    let engine = CartEngine::new(Arc::clone(&source), EngineConfig::default());

    let req = ItemRequest::bundle("menu", vec![sub("burger", 1), sub("mystery", 1)]);
    let snap = engine.add(&req, 2).await.unwrap();

    // the unpriced sub drops out of the sum; no error
    assert_eq!(snap.total(), minor(1000));
    assert_eq!(snap.quantity_of(&req.key()), 2);
}

#[tokio::test]
async fn identical_bundle_sequences_merge() {
    init_tracing();
    let source = Arc::new(StubSource::new(&[]).with_subs(&[("burger", 5.00), ("fries", 2.50)]));
    let engine = CartEngine::new(Arc::clone(&source), EngineConfig::default());

    let req = ItemRequest::bundle("menu", vec![sub("burger", 1), sub("fries", 1)]);
    engine.add(&req, 1).await.unwrap();
    let snap = engine.add(&req, 1).await.unwrap();

    assert_eq!(snap.line_count(), 1);
    assert_eq!(snap.quantity_of(&req.key()), 2);
    assert_eq!(source.calls(), 1); // second add was a cache hit
}

#[tokio::test]
async fn reordered_bundle_sub_items_are_a_distinct_line() {
    init_tracing();
    let source = Arc::new(StubSource::new(&[]).with_subs(&[("burger", 5.00), ("fries", 2.50)]));
    let engine = CartEngine::new(Arc::clone(&source), EngineConfig::default());

    let ab = ItemRequest::bundle("menu", vec![sub("burger", 1), sub("fries", 1)]);
    let ba = ItemRequest::bundle("menu", vec![sub("fries", 1), sub("burger", 1)]);

    engine.add(&ab, 1).await.unwrap();
    let snap = engine.add(&ba, 1).await.unwrap();

    assert_eq!(snap.line_count(), 2);
}

// =============================================================================
// Observer Stream
// =============================================================================

#[tokio::test]
async fn subscriber_sees_initial_plus_one_snapshot_per_mutation() {
    let (engine, _) = engine_with(&[("tea", 1.00), ("coffee", 2.50)]);
    let tea = ItemRequest::simple("tea");
    let coffee = ItemRequest::simple("coffee");

    let mut stream = engine.observe();

    engine.add(&tea, 2).await.unwrap(); // 200
    engine.add(&coffee, 1).await.unwrap(); // 450
    engine.add(&tea, 1).await.unwrap(); // 550
    engine.remove(&tea, 3).unwrap(); // 250
    engine.clear(); // 0

    let expected = [0, 200, 450, 550, 250, 0];
    for want in expected {
        let snap = stream.recv().await.expect("stream ended early");
        assert_eq!(snap.total(), minor(want));
    }
}

#[tokio::test]
async fn late_subscriber_replays_current_state_first() {
    let (engine, _) = engine_with(&[("tea", 1.00)]);
    let tea = ItemRequest::simple("tea");

    engine.add(&tea, 2).await.unwrap();

    let mut stream = engine.observe();
    let first = stream.recv().await.unwrap();
    assert_eq!(first.total(), minor(200)); // current state, not the initial empty one

    engine.add(&tea, 1).await.unwrap();
    let second = stream.recv().await.unwrap();
    assert_eq!(second.total(), minor(300));
}

#[tokio::test]
async fn noop_remove_publishes_nothing() {
    let (engine, _) = engine_with(&[("tea", 1.00)]);
    let mut stream = engine.observe();

    engine.remove(&ItemRequest::simple("tea"), 1).unwrap(); // absent: no-op
    engine.add(&ItemRequest::simple("tea"), 1).await.unwrap();

    // initial replay, then the add - nothing in between for the no-op
    assert_eq!(stream.recv().await.unwrap().total(), Money::zero());
    assert_eq!(stream.recv().await.unwrap().total(), minor(100));
}

#[tokio::test]
async fn multiple_subscribers_see_the_same_sequence() {
    let (engine, _) = engine_with(&[("tea", 1.00)]);
    let tea = ItemRequest::simple("tea");

    let mut a = engine.observe();
    let mut b = engine.observe();

    engine.add(&tea, 1).await.unwrap();
    engine.add(&tea, 1).await.unwrap();

    for stream in [&mut a, &mut b] {
        assert_eq!(stream.recv().await.unwrap().total(), Money::zero());
        assert_eq!(stream.recv().await.unwrap().total(), minor(100));
        assert_eq!(stream.recv().await.unwrap().total(), minor(200));
    }
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_adds_for_same_new_key_never_duplicate() {
    init_tracing();
    let source = Arc::new(
        StubSource::new(&[("tea", 1.75)]).with_delay(Duration::from_millis(50)),
    );
    let engine = Arc::new(CartEngine::new(
        Arc::clone(&source),
        EngineConfig::default(),
    ));

    let a = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.add(&ItemRequest::simple("tea"), 1).await })
    };
    let b = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.add(&ItemRequest::simple("tea"), 1).await })
    };

    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    // Both adds likely raced past the cache check and paid for a lookup,
    // but the committed state has exactly one line and no lost update.
    let snap = engine.snapshot();
    assert_eq!(snap.line_count(), 1);
    assert_eq!(snap.quantity_of(&ItemRequest::simple("tea").key()), 2);
    assert_eq!(snap.total(), minor(350));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_adds_for_different_keys_both_land() {
    init_tracing();
    let source = Arc::new(
        StubSource::new(&[("tea", 1.00), ("coffee", 2.50)])
            .with_delay(Duration::from_millis(20)),
    );
    let engine = Arc::new(CartEngine::new(
        Arc::clone(&source),
        EngineConfig::default(),
    ));

    let a = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.add(&ItemRequest::simple("tea"), 1).await })
    };
    let b = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.add(&ItemRequest::simple("coffee"), 1).await })
    };

    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    let snap = engine.snapshot();
    assert_eq!(snap.line_count(), 2);
    assert_eq!(snap.total(), minor(350));
}

#[tokio::test]
async fn cancelled_add_leaves_snapshot_unchanged() {
    init_tracing();
    let source = Arc::new(
        StubSource::new(&[("tea", 1.75)]).with_delay(Duration::from_millis(200)),
    );
    let engine = CartEngine::new(Arc::clone(&source), EngineConfig::default());

    // Cancel while the add is suspended on the price source.
    let result = tokio::time::timeout(
        Duration::from_millis(20),
        engine.add(&ItemRequest::simple("tea"), 1),
    )
    .await;

    assert!(result.is_err()); // timed out, future dropped before commit
    assert!(engine.snapshot().is_empty());
}

// =============================================================================
// Price Exactness
// =============================================================================

/// Drives random add/remove sequences against a reference model kept in
/// plain integer arithmetic and checks the published total after every
/// operation. Catches any floating-point accumulation sneaking in.
#[tokio::test]
async fn total_price_is_exact_over_random_sequences() {
    let catalog: [(&str, f64, i64); 5] = [
        ("a", 1.00, 100),
        ("b", 1.50, 150),
        ("c", 1.75, 175),
        ("d", 2.50, 250),
        ("e", 5.00, 500),
    ];
    let prices: Vec<(&str, f64)> = catalog.iter().map(|&(id, p, _)| (id, p)).collect();

    let mut rng = StdRng::seed_from_u64(0x0ca7);

    for _ in 0..10 {
        let (engine, _) = engine_with(&prices);
        let mut model: HashMap<&str, i64> = HashMap::new();

        for _ in 0..100 {
            let (id, _, _) = catalog[rng.gen_range(0..catalog.len())];
            let count = rng.gen_range(1..=3);
            let req = ItemRequest::simple(id);

            if rng.gen_bool(0.6) {
                engine.add(&req, count).await.unwrap();
                *model.entry(id).or_insert(0) += count;
            } else {
                engine.remove(&req, count).unwrap();
                let qty = model.entry(id).or_insert(0);
                *qty = (*qty - count).max(0);
            }

            let expected: i64 = model
                .iter()
                .map(|(id, qty)| {
                    let unit = catalog.iter().find(|&&(c, _, _)| c == *id).unwrap().2;
                    unit * qty
                })
                .sum();
            assert_eq!(engine.current_price().minor_units(), expected);
            assert_eq!(engine.current_price().minor_units(), unit_check(&engine));

            // quantity bookkeeping matches too
            assert_eq!(
                engine.count_for(&req),
                *model.get(id).unwrap_or(&0),
            );
        }
    }
}

/// The published total must equal the literal sum of entry line totals.
fn unit_check(engine: &CartEngine<Arc<StubSource>>) -> i64 {
    engine
        .current_entries()
        .iter()
        .map(|e| e.line_total().minor_units())
        .sum()
}

// =============================================================================
// Construction
// =============================================================================

#[tokio::test]
async fn engine_starts_from_supplied_entries() {
    use cart_engine::LineEntry;

    init_tracing();
    let source = Arc::new(StubSource::new(&[("tea", 1.75)]));
    let entries = vec![LineEntry::new_simple("tea", None, minor(175), 2)];
    let engine = CartEngine::with_entries(Arc::clone(&source), EngineConfig::default(), entries);

    assert_eq!(engine.current_price(), minor(350));

    // the pre-seeded line counts as cached: no lookup on further adds
    engine.add(&ItemRequest::simple("tea"), 1).await.unwrap();
    assert_eq!(source.calls(), 0);
    assert_eq!(engine.current_price(), minor(525));
}

#[tokio::test]
async fn custom_scale_is_applied_at_conversion() {
    use cart_engine::PriceScale;

    init_tracing();
    let source = Arc::new(StubSource::new(&[("gold", 1.2345)]));
    let config = EngineConfig {
        scale: PriceScale::from_fraction_digits(4),
        ..EngineConfig::default()
    };
    let engine = CartEngine::new(Arc::clone(&source), config);

    let snap = engine.add(&ItemRequest::simple("gold"), 2).await.unwrap();
    assert_eq!(snap.total(), minor(24_690)); // 12345 * 2 at scale 10_000
}
