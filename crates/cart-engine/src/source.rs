//! # Price Source Seam
//!
//! The one external collaborator the engine consults: something that can
//! resolve an item (or a bundle's sub-items) to a decimal price. Typically
//! network-bound and slow; the engine only calls it on the cache-miss path
//! of `add` and never holds its commit lock across the call.

use async_trait::async_trait;
use cart_core::{CartResult, SubItemRequest};

/// A price returned for one sub-item of a bundle.
#[derive(Debug, Clone, PartialEq)]
pub struct SubItemPrice {
    /// The sub-item this price belongs to (matched against the request's
    /// `sub_id`).
    pub sub_id: String,

    /// Decimal price of one unit of the sub-item.
    pub price: f64,
}

/// Resolves requested items to prices.
///
/// ## Contract
/// - `resolve_simple` returning `Ok(None)` means "this item does not
///   exist"; `add` turns that into [`cart_core::CartError::ProductNotFound`].
/// - `resolve_bundle` may return fewer prices than sub-items requested;
///   missing sub-items are excluded from the bundle's price, never treated
///   as an error (bundles tolerate partial pricing).
/// - Failures (network, timeout, ...) are reported via
///   [`cart_core::CartError::PriceSource`] and propagate to the caller of
///   `add` untranslated; the engine performs no retries.
///
/// Prices are decimal at this boundary; the engine converts them to
/// scaled-integer [`cart_core::Money`] exactly once, before any arithmetic.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Resolves a simple item (and optional variant) to its unit price.
    async fn resolve_simple(&self, id: &str, variant: Option<&str>) -> CartResult<Option<f64>>;

    /// Resolves every sub-item of a bundle independently.
    ///
    /// The returned sequence is matched against the request by `sub_id`;
    /// order is irrelevant and extra entries are ignored.
    async fn resolve_bundle(
        &self,
        id: &str,
        sub_items: &[SubItemRequest],
    ) -> CartResult<Vec<SubItemPrice>>;
}

#[async_trait]
impl<T: PriceSource + ?Sized> PriceSource for std::sync::Arc<T> {
    async fn resolve_simple(&self, id: &str, variant: Option<&str>) -> CartResult<Option<f64>> {
        (**self).resolve_simple(id, variant).await
    }

    async fn resolve_bundle(
        &self,
        id: &str,
        sub_items: &[SubItemRequest],
    ) -> CartResult<Vec<SubItemPrice>> {
        (**self).resolve_bundle(id, sub_items).await
    }
}
