//! # Snapshot
//!
//! An immutable, fully-consistent view of the cart at one point in logical
//! time: the full entry list plus a precisely-accumulated total price.
//!
//! Snapshots are never mutated after construction - the engine replaces the
//! current one wholesale on every committed mutation, so readers always see
//! an internally consistent value.

use serde::{Deserialize, Serialize};

use crate::entry::{LineEntry, LineKey};
use crate::money::Money;

/// The cart's state at one point in logical time.
///
/// ## Invariants
/// - `total == sum(entry.line_total)` exactly (integer accumulation)
/// - entries are unique by identity key
///
/// Both are upheld by construction: the total is always recomputed from the
/// entry list, and entry lists only ever come out of the merge algebra,
/// which never produces duplicate keys from a duplicate-free input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    total: Money,
    entries: Vec<LineEntry>,
}

impl CartSnapshot {
    /// The empty snapshot: no entries, zero total.
    pub fn empty() -> Self {
        CartSnapshot {
            total: Money::zero(),
            entries: Vec::new(),
        }
    }

    /// Builds a snapshot from an entry list, computing the exact total.
    pub fn from_entries(entries: Vec<LineEntry>) -> Self {
        let total = entries.iter().map(LineEntry::line_total).sum();
        CartSnapshot { total, entries }
    }

    /// The total price: the exact sum of all entry line totals.
    #[inline]
    pub fn total(&self) -> Money {
        self.total
    }

    /// The entry list, unique by identity key, in first-appearance order.
    #[inline]
    pub fn entries(&self) -> &[LineEntry] {
        &self.entries
    }

    /// Quantity of the entry matching `key`, or 0 if none.
    pub fn quantity_of(&self, key: &LineKey) -> i64 {
        self.entries
            .iter()
            .find(|e| e.key() == *key)
            .map_or(0, LineEntry::quantity)
    }

    /// Looks up the entry matching `key`.
    pub fn entry_for(&self, key: &LineKey) -> Option<&LineEntry> {
        self.entries.iter().find(|e| e.key() == *key)
    }

    /// Number of distinct lines.
    #[inline]
    pub fn line_count(&self) -> usize {
        self.entries.len()
    }

    /// Total quantity across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.entries.iter().map(LineEntry::quantity).sum()
    }

    /// Checks if the cart is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CartSnapshot {
    fn default() -> Self {
        CartSnapshot::empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
