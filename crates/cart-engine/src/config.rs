//! # Engine Configuration
//!
//! Construction-time configuration for [`crate::CartEngine`]. Values that
//! could have been ambient defaults (the price scale in particular) are
//! explicit here so call sites never depend on hidden globals.

use cart_core::PriceScale;

/// Default capacity of the snapshot broadcast channel.
///
/// A subscriber that falls more than this many snapshots behind skips
/// forward (with a warning) rather than blocking commits.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Configuration for a [`crate::CartEngine`] instance.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Conversion factor between adapter decimal prices and minor units.
    pub scale: PriceScale,

    /// Capacity of the snapshot broadcast channel.
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            scale: PriceScale::default(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}
