//! # Line-Entry Model
//!
//! Value types for one row of the cart and for the requests that target it.
//!
//! ## Identity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Identity Keys                                   │
//! │                                                                         │
//! │  Simple item:   (item_id, variant?)                                     │
//! │                                                                         │
//! │  Bundle item:   (item_id, [(sub_id, sub_variant?), ...])                │
//! │                 sub-item ORDER is significant; sub-item QUANTITY is not │
//! │                                                                         │
//! │  Two requests with the same key refer to the same logical cart line    │
//! │  and are merged, never duplicated.                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Price Freezing
//! An entry freezes its `unit_price` (and `added_at`) the moment it is first
//! created. Later adds for the same key reuse the frozen price instead of
//! consulting the price source again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Requests
// =============================================================================

/// One sub-item inside a bundle request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubItemRequest {
    /// Sub-item ID.
    pub sub_id: String,

    /// Optional variant of the sub-item.
    pub sub_variant: Option<String>,

    /// How many of this sub-item one bundle contains.
    pub quantity: i64,
}

/// What a caller asks the engine to add or remove.
///
/// The request carries everything needed to derive the identity key and, on
/// a cache miss, everything the price source needs to price the line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "kind")]
pub enum ItemRequest {
    /// A plain item, optionally in a specific variant.
    Simple {
        id: String,
        variant: Option<String>,
    },
    /// A composite item built from an ordered list of sub-items.
    Bundle {
        id: String,
        sub_items: Vec<SubItemRequest>,
    },
}

impl ItemRequest {
    /// Convenience constructor for a simple request without a variant.
    pub fn simple(id: impl Into<String>) -> Self {
        ItemRequest::Simple {
            id: id.into(),
            variant: None,
        }
    }

    /// Convenience constructor for a simple request with a variant.
    pub fn simple_variant(id: impl Into<String>, variant: impl Into<String>) -> Self {
        ItemRequest::Simple {
            id: id.into(),
            variant: Some(variant.into()),
        }
    }

    /// Convenience constructor for a bundle request.
    pub fn bundle(id: impl Into<String>, sub_items: Vec<SubItemRequest>) -> Self {
        ItemRequest::Bundle {
            id: id.into(),
            sub_items,
        }
    }

    /// Derives the identity key for this request.
    pub fn key(&self) -> LineKey {
        match self {
            ItemRequest::Simple { id, variant } => LineKey::Simple {
                id: id.clone(),
                variant: variant.clone(),
            },
            ItemRequest::Bundle { id, sub_items } => LineKey::Bundle {
                id: id.clone(),
                subs: sub_items
                    .iter()
                    .map(|s| (s.sub_id.clone(), s.sub_variant.clone()))
                    .collect(),
            },
        }
    }
}

// =============================================================================
// Identity Key
// =============================================================================

/// The tuple of fields that decides whether two requests hit the same line.
///
/// ## Design Notes
/// - For bundles the sub-item list is ORDER-SIGNIFICANT: the same subs in a
///   different order are a different line.
/// - Sub-item quantities are deliberately excluded; they affect price, not
///   identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "kind")]
pub enum LineKey {
    Simple {
        id: String,
        variant: Option<String>,
    },
    Bundle {
        id: String,
        subs: Vec<(String, Option<String>)>,
    },
}

// =============================================================================
// Line Entries
// =============================================================================

/// A simple-item line in the cart.
///
/// ## Invariants
/// - `quantity >= 1` (a line decremented to zero is removed, never kept)
/// - `line_total == unit_price * quantity`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleEntry {
    /// Item ID.
    pub id: String,

    /// Variant at time of adding (frozen).
    pub variant: Option<String>,

    /// Unit price at time of adding (frozen).
    pub unit_price: Money,

    /// Line total (unit_price × quantity).
    pub line_total: Money,

    /// Quantity in cart.
    pub quantity: i64,

    /// When this line was first added to the cart.
    pub added_at: DateTime<Utc>,
}

/// One sub-item recorded inside a bundle line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleSubItem {
    pub sub_id: String,
    pub sub_variant: Option<String>,
    pub quantity: i64,
}

/// A bundle line in the cart. Same invariants as [`SimpleEntry`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry {
    /// Bundle ID.
    pub id: String,

    /// Ordered sub-items at time of adding (frozen).
    pub sub_items: Vec<BundleSubItem>,

    /// Unit price of one whole bundle at time of adding (frozen).
    pub unit_price: Money,

    /// Line total (unit_price × quantity).
    pub line_total: Money,

    /// Quantity in cart.
    pub quantity: i64,

    /// When this line was first added to the cart.
    pub added_at: DateTime<Utc>,
}

/// One row of the cart: a simple item or a bundle.
///
/// An explicit sum type, dispatched by pattern matching at the few sites
/// that care which kind it is (merge, price computation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum LineEntry {
    Simple(SimpleEntry),
    Bundle(BundleEntry),
}

impl LineEntry {
    /// Creates a simple entry, computing the line total from the frozen
    /// unit price and quantity.
    pub fn new_simple(
        id: impl Into<String>,
        variant: Option<String>,
        unit_price: Money,
        quantity: i64,
    ) -> Self {
        LineEntry::Simple(SimpleEntry {
            id: id.into(),
            variant,
            unit_price,
            line_total: unit_price.multiply_quantity(quantity),
            quantity,
            added_at: Utc::now(),
        })
    }

    /// Creates a bundle entry, computing the line total from the frozen
    /// unit price and quantity.
    pub fn new_bundle(
        id: impl Into<String>,
        sub_items: Vec<BundleSubItem>,
        unit_price: Money,
        quantity: i64,
    ) -> Self {
        LineEntry::Bundle(BundleEntry {
            id: id.into(),
            sub_items,
            unit_price,
            line_total: unit_price.multiply_quantity(quantity),
            quantity,
            added_at: Utc::now(),
        })
    }

    /// Derives the identity key for this entry.
    pub fn key(&self) -> LineKey {
        match self {
            LineEntry::Simple(e) => LineKey::Simple {
                id: e.id.clone(),
                variant: e.variant.clone(),
            },
            LineEntry::Bundle(e) => LineKey::Bundle {
                id: e.id.clone(),
                subs: e
                    .sub_items
                    .iter()
                    .map(|s| (s.sub_id.clone(), s.sub_variant.clone()))
                    .collect(),
            },
        }
    }

    /// Whether this entry and `other` are the same logical cart line.
    ///
    /// Identity-key equality only: two entries with different prices or
    /// quantities are still "the same line" if their keys match. Full
    /// structural equality (`==`) is reserved for exact-duplicate checks.
    pub fn same_line(&self, other: &LineEntry) -> bool {
        self.key() == other.key()
    }

    /// Quantity in cart.
    #[inline]
    pub fn quantity(&self) -> i64 {
        match self {
            LineEntry::Simple(e) => e.quantity,
            LineEntry::Bundle(e) => e.quantity,
        }
    }

    /// Frozen unit price.
    #[inline]
    pub fn unit_price(&self) -> Money {
        match self {
            LineEntry::Simple(e) => e.unit_price,
            LineEntry::Bundle(e) => e.unit_price,
        }
    }

    /// Line total (unit_price × quantity).
    #[inline]
    pub fn line_total(&self) -> Money {
        match self {
            LineEntry::Simple(e) => e.line_total,
            LineEntry::Bundle(e) => e.line_total,
        }
    }

    /// Returns a copy of this entry with the given quantity and line total.
    ///
    /// Used by the merge algebra; the frozen unit price, sub-items and
    /// `added_at` are carried over unchanged.
    pub(crate) fn with_amounts(&self, quantity: i64, line_total: Money) -> LineEntry {
        match self {
            LineEntry::Simple(e) => LineEntry::Simple(SimpleEntry {
                quantity,
                line_total,
                ..e.clone()
            }),
            LineEntry::Bundle(e) => LineEntry::Bundle(BundleEntry {
                quantity,
                line_total,
                ..e.clone()
            }),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
