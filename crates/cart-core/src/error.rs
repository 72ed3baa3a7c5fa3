//! # Error Types
//!
//! Domain errors for the cart engine.
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (item ID, requested count)
//! 3. Errors are enum variants, never String
//! 4. Price-source failures pass through untranslated - the engine never
//!    swallows or retries them; retry policy belongs to the host
//!
//! Notably NOT an error: removing more than present, or removing an absent
//! line. That is a documented silent no-op to keep UI-driven decrement
//! flows simple.

use thiserror::Error;

/// Errors reported synchronously to the caller of a mutating operation.
///
/// Every variant leaves the snapshot untouched: validation happens before
/// anything else, and a failed price lookup aborts before commit.
#[derive(Debug, Error)]
pub enum CartError {
    /// The requested count was below 1.
    ///
    /// Raised by both `add` and `remove` before the snapshot or the price
    /// source is consulted.
    #[error("quantity must be at least 1, got {requested}")]
    InvalidQuantity { requested: i64 },

    /// The price source reported no price for a simple item.
    ///
    /// Only possible on the cache-miss path of `add`: once a line exists,
    /// repeated adds reuse its frozen price and never look the item up
    /// again. Bundles never raise this - unpriced sub-items are simply
    /// excluded from the bundle's price.
    #[error("product not found: {id}")]
    ProductNotFound { id: String },

    /// A price-source failure (network, timeout, ...), passed through as-is.
    #[error("price source failure: {0}")]
    PriceSource(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl CartError {
    /// Wraps an adapter-level failure for propagation to the caller.
    pub fn price_source(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        CartError::PriceSource(err.into())
    }
}

/// Convenience type alias for Results with CartError.
pub type CartResult<T> = Result<T, CartError>;

// =============================================================================
// Unit Tests
// =============================================================================
