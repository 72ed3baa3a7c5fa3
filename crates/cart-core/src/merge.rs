//! # Merge Algebra
//!
//! Pure functions that combine two entry lists (addition) or subtract one
//! list from another (removal). No I/O, no side effects: the engine calls
//! these to compute the next snapshot before committing it.
//!
//! ## Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  merge_add(base, incoming)                                              │
//! │    key match     → quantity and line total increased in place           │
//! │    no match      → incoming entry APPENDED (first-appearance order)     │
//! │                                                                         │
//! │  merge_subtract(base, to_remove)                                        │
//! │    key match, remainder > 0  → decremented copy replaces the entry      │
//! │    key match, remainder <= 0 → entry deleted entirely                   │
//! │    no match                  → silent no-op (policy, not an error)      │
//! │                                                                         │
//! │  Pre-existing entries always keep their original relative order.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::entry::LineEntry;

/// Merges `incoming` entries into `base` by identity key.
///
/// A matched base entry is replaced by a copy whose quantity and line total
/// are increased by the incoming entry's amounts; the frozen unit price and
/// `added_at` of the base entry are kept. Unmatched incoming entries are
/// appended in the order they were supplied.
pub fn merge_add(base: &[LineEntry], incoming: &[LineEntry]) -> Vec<LineEntry> {
    let mut result: Vec<LineEntry> = base.to_vec();

    for inc in incoming {
        match result.iter_mut().find(|e| e.same_line(inc)) {
            Some(existing) => {
                let quantity = existing.quantity() + inc.quantity();
                let line_total = existing.line_total() + inc.line_total();
                *existing = existing.with_amounts(quantity, line_total);
            }
            None => result.push(inc.clone()),
        }
    }

    result
}

/// Subtracts `to_remove` entries from `base` by identity key.
///
/// A matched entry whose remaining quantity stays positive is replaced by a
/// decremented copy (line total recomputed from its frozen unit price so the
/// `line_total == unit_price * quantity` invariant holds). A remainder of
/// zero or less deletes the entry. Entries in `to_remove` with no match are
/// ignored: removing more than present, or an absent line, has no effect.
pub fn merge_subtract(base: &[LineEntry], to_remove: &[LineEntry]) -> Vec<LineEntry> {
    let mut result: Vec<LineEntry> = base.to_vec();

    for rem in to_remove {
        let Some(pos) = result.iter().position(|e| e.same_line(rem)) else {
            continue;
        };

        let remaining = result[pos].quantity() - rem.quantity();
        if remaining > 0 {
            let line_total = result[pos].unit_price().multiply_quantity(remaining);
            result[pos] = result[pos].with_amounts(remaining, line_total);
        } else {
            result.remove(pos);
        }
    }

    result
}

// =============================================================================
// Unit Tests
// =============================================================================
