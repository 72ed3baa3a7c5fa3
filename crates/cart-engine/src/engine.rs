//! # Cart Engine
//!
//! Owns the current [`CartSnapshot`], exposes synchronous reads and the
//! add/remove/clear mutations, and publishes every committed snapshot to
//! observers.
//!
//! ## Concurrency Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Mutation Commit Protocol                             │
//! │                                                                         │
//! │  add(request, n)                                                        │
//! │    ├─ count < 1 ───────────────► Err(InvalidQuantity), state untouched  │
//! │    │                                                                    │
//! │    ├─ [lock] key present? ─────► merge with frozen price, publish       │
//! │    │                             (fast path: NO price lookup)           │
//! │    │                                                                    │
//! │    └─ cache miss:                                                       │
//! │         resolve price  ◄──────── NO lock held across this await         │
//! │         [lock] re-check key ───► merge-vs-append decided under lock     │
//! │         publish                                                         │
//! │                                                                         │
//! │  remove / clear / reads ───────► never suspend                          │
//! │                                                                         │
//! │  The state mutex is held only across pure computation plus the          │
//! │  broadcast send, so commits are totally ordered and the classic         │
//! │  check-then-act race (two adds of the same NEW key both appending)      │
//! │  cannot happen. Two concurrent adds may both pay for a price lookup;    │
//! │  neither can lose an update or duplicate a line.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cancelling an in-flight `add` while it awaits the price source leaves
//! the snapshot unchanged: nothing is written before the commit section,
//! and the commit section contains no await point.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast;
use tracing::{debug, warn};

use cart_core::{
    merge_add, merge_subtract, BundleSubItem, CartError, CartResult, CartSnapshot, ItemRequest,
    LineEntry, Money,
};

use crate::config::EngineConfig;
use crate::source::PriceSource;

// =============================================================================
// Shared State
// =============================================================================

/// State shared by all handles to one engine instance.
struct Shared {
    /// The commit lock and the single shared mutable value: the current
    /// snapshot. Replaced wholesale on every commit, never mutated in
    /// place. Held only across pure computation and the broadcast send,
    /// never across an await point.
    state: Mutex<CartSnapshot>,

    /// Every committed snapshot is sent here, in commit order, while the
    /// state lock is held.
    events: broadcast::Sender<CartSnapshot>,
}

// =============================================================================
// Cart Engine
// =============================================================================

/// The cart mutation engine.
///
/// Usable from multiple concurrent tasks; clone it (or wrap it in an `Arc`)
/// to share one cart. All handles observe the same snapshot sequence.
///
/// ## Example
/// ```rust,ignore
/// let engine = CartEngine::new(catalog, EngineConfig::default());
/// engine.add(&ItemRequest::simple("tea"), 2).await?;
/// assert_eq!(engine.count_for(&ItemRequest::simple("tea")), 2);
/// ```
pub struct CartEngine<S> {
    source: S,
    config: EngineConfig,
    shared: Arc<Shared>,
}

impl<S> CartEngine<S> {
    /// Creates an engine with an empty cart.
    pub fn new(source: S, config: EngineConfig) -> Self {
        Self::with_entries(source, config, Vec::new())
    }

    /// Creates an engine from an externally supplied initial entry list.
    ///
    /// The initial snapshot total is recomputed from the entries; callers
    /// are trusted to supply a list that is unique by identity key (e.g.
    /// one previously read from [`CartEngine::current_entries`]).
    pub fn with_entries(source: S, config: EngineConfig, entries: Vec<LineEntry>) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity);
        CartEngine {
            source,
            config,
            shared: Arc::new(Shared {
                state: Mutex::new(CartSnapshot::from_entries(entries)),
                events,
            }),
        }
    }

    // -------------------------------------------------------------------------
    // Reads (synchronous, answer from the current snapshot only)
    // -------------------------------------------------------------------------

    /// The current snapshot.
    pub fn snapshot(&self) -> CartSnapshot {
        self.lock_state().clone()
    }

    /// The current total price.
    pub fn current_price(&self) -> Money {
        self.lock_state().total()
    }

    /// The current entry list.
    pub fn current_entries(&self) -> Vec<LineEntry> {
        self.lock_state().entries().to_vec()
    }

    /// Quantity of the line matching `request`, or 0 if none.
    pub fn count_for(&self, request: &ItemRequest) -> i64 {
        self.lock_state().quantity_of(&request.key())
    }

    /// Subscribes to the snapshot stream.
    ///
    /// The subscriber immediately receives the current snapshot, then every
    /// subsequent committed one in commit order. Subscription and the
    /// current-snapshot read happen atomically under the commit lock, so
    /// the replayed snapshot is the exact predecessor of the first live one.
    pub fn observe(&self) -> SnapshotStream {
        let guard = self.lock_state();
        let rx = self.shared.events.subscribe();
        SnapshotStream {
            replay: Some(guard.clone()),
            rx,
        }
    }

    // -------------------------------------------------------------------------
    // Mutations that never suspend
    // -------------------------------------------------------------------------

    /// Decrements (and at zero removes) the line matching `request`.
    ///
    /// Removing more than present, or a line that is absent, is a silent
    /// no-op by design - the returned snapshot is simply the current one
    /// and nothing is published.
    ///
    /// ## Errors
    /// [`CartError::InvalidQuantity`] if `count < 1`.
    pub fn remove(&self, request: &ItemRequest, count: i64) -> CartResult<CartSnapshot> {
        if count < 1 {
            return Err(CartError::InvalidQuantity { requested: count });
        }

        let mut guard = self.lock_state();
        let Some(existing) = guard.entry_for(&request.key()) else {
            return Ok(guard.clone());
        };

        let to_remove = entry_from_request(request, existing.unit_price(), count);
        let next = CartSnapshot::from_entries(merge_subtract(guard.entries(), &[to_remove]));
        debug!(total = %next.total(), lines = next.line_count(), "committed remove");
        Ok(self.publish(&mut guard, next))
    }

    /// Resets the cart to the empty snapshot. Cannot fail, never suspends.
    pub fn clear(&self) -> CartSnapshot {
        let mut guard = self.lock_state();
        debug!("cleared cart");
        self.publish(&mut guard, CartSnapshot::empty())
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn lock_state(&self) -> MutexGuard<'_, CartSnapshot> {
        self.shared.state.lock().expect("cart state mutex poisoned")
    }

    /// Replaces the current snapshot and broadcasts it, under the lock the
    /// caller already holds. Send order therefore equals commit order.
    fn publish(&self, state: &mut CartSnapshot, next: CartSnapshot) -> CartSnapshot {
        *state = next.clone();
        // No receivers is fine; the cart works without observers.
        let _ = self.shared.events.send(next.clone());
        next
    }

    /// Fast path of `add`: if a line with the request's key exists, merge
    /// into it using its frozen unit price - no price lookup.
    fn try_merge_existing(&self, request: &ItemRequest, count: i64) -> Option<CartSnapshot> {
        let mut guard = self.lock_state();
        let existing = guard.entry_for(&request.key())?;
        let incoming = entry_from_request(request, existing.unit_price(), count);
        let next = CartSnapshot::from_entries(merge_add(guard.entries(), &[incoming]));
        debug!(total = %next.total(), "merged into existing line");
        Some(self.publish(&mut guard, next))
    }

    /// Commit section of the cache-miss path of `add`.
    fn commit_add(&self, request: &ItemRequest, count: i64, resolved: Money) -> CartSnapshot {
        let mut guard = self.lock_state();
        // Re-check under the lock: a concurrent add for the same new key may
        // have committed while this one awaited the price source. If the
        // line exists now, its frozen price wins and merge_add merges;
        // otherwise merge_add appends the freshly priced entry.
        let unit_price = guard
            .entry_for(&request.key())
            .map(LineEntry::unit_price)
            .unwrap_or(resolved);
        let incoming = entry_from_request(request, unit_price, count);
        let next = CartSnapshot::from_entries(merge_add(guard.entries(), &[incoming]));
        debug!(total = %next.total(), lines = next.line_count(), "committed add");
        self.publish(&mut guard, next)
    }
}

impl<S: PriceSource> CartEngine<S> {
    /// Adds `count` of the requested item, merging into an existing line or
    /// creating a new one.
    ///
    /// If a line with the request's identity key already exists this is the
    /// dominant fast path: the line's frozen price is reused and the price
    /// source is NOT consulted. Only a cache miss awaits the source.
    ///
    /// ## Errors
    /// - [`CartError::InvalidQuantity`] if `count < 1` (checked before
    ///   anything else; snapshot untouched).
    /// - [`CartError::ProductNotFound`] if the source reports no price for
    ///   a simple item; snapshot untouched.
    /// - [`CartError::PriceSource`] for source failures, passed through
    ///   untranslated; snapshot untouched.
    pub async fn add(&self, request: &ItemRequest, count: i64) -> CartResult<CartSnapshot> {
        if count < 1 {
            return Err(CartError::InvalidQuantity { requested: count });
        }

        if let Some(snapshot) = self.try_merge_existing(request, count) {
            return Ok(snapshot);
        }

        // Cache miss. The price lookup runs without the lock so other
        // mutations (and other lookups) proceed concurrently.
        let resolved = self.resolve_unit_price(request).await?;
        Ok(self.commit_add(request, count, resolved))
    }

    /// Resolves the unit price for a not-yet-present line.
    async fn resolve_unit_price(&self, request: &ItemRequest) -> CartResult<Money> {
        match request {
            ItemRequest::Simple { id, variant } => {
                match self.source.resolve_simple(id, variant.as_deref()).await? {
                    Some(price) => Ok(self.config.scale.to_minor(price)),
                    None => Err(CartError::ProductNotFound { id: id.clone() }),
                }
            }
            ItemRequest::Bundle { id, sub_items } => {
                let prices = self.source.resolve_bundle(id, sub_items).await?;
                let by_id: HashMap<&str, f64> = prices
                    .iter()
                    .map(|p| (p.sub_id.as_str(), p.price))
                    .collect();

                // Convert each sub price to minor units FIRST, then weight
                // by the sub-item's own quantity. Sub-items the source
                // declined to price drop out of the sum.
                let mut unit_price = Money::zero();
                for sub in sub_items {
                    match by_id.get(sub.sub_id.as_str()) {
                        Some(&price) => {
                            unit_price +=
                                self.config.scale.to_minor(price).multiply_quantity(sub.quantity);
                        }
                        None => {
                            debug!(bundle = %id, sub = %sub.sub_id, "sub-item unpriced, excluded");
                        }
                    }
                }
                Ok(unit_price)
            }
        }
    }
}

/// Handles share the same cart: cloning does not copy state.
impl<S: Clone> Clone for CartEngine<S> {
    fn clone(&self) -> Self {
        CartEngine {
            source: self.source.clone(),
            config: self.config.clone(),
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Builds the entry a request would create at the given frozen price.
fn entry_from_request(request: &ItemRequest, unit_price: Money, count: i64) -> LineEntry {
    match request {
        ItemRequest::Simple { id, variant } => {
            LineEntry::new_simple(id.clone(), variant.clone(), unit_price, count)
        }
        ItemRequest::Bundle { id, sub_items } => LineEntry::new_bundle(
            id.clone(),
            sub_items
                .iter()
                .map(|s| BundleSubItem {
                    sub_id: s.sub_id.clone(),
                    sub_variant: s.sub_variant.clone(),
                    quantity: s.quantity,
                })
                .collect(),
            unit_price,
            count,
        ),
    }
}

// =============================================================================
// Snapshot Stream
// =============================================================================

/// A replay-latest subscription to the snapshot stream.
///
/// Yields the snapshot that was current at subscription time, then every
/// committed snapshot in commit order. Returns `None` once the engine (all
/// handles) has been dropped.
pub struct SnapshotStream {
    replay: Option<CartSnapshot>,
    rx: broadcast::Receiver<CartSnapshot>,
}

impl SnapshotStream {
    /// Receives the next snapshot.
    ///
    /// A subscriber that falls further behind than the engine's
    /// `event_capacity` skips to the oldest retained snapshot (logged as a
    /// warning); commit order itself is never reordered.
    pub async fn recv(&mut self) -> Option<CartSnapshot> {
        if let Some(current) = self.replay.take() {
            return Some(current);
        }
        loop {
            match self.rx.recv().await {
                Ok(snapshot) => return Some(snapshot),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "snapshot subscriber lagged, skipping ahead");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
