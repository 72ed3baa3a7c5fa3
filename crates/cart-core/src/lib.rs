//! # cart-core: Pure Business Logic for the Cart Engine
//!
//! This crate is the **heart** of the cart engine. It contains all business
//! logic as pure functions and value types with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Cart Engine Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Host Application                             │   │
//! │  │        (UI / transport wiring, not part of this repo)           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    cart-engine (async)                          │   │
//! │  │      CartEngine, PriceSource seam, snapshot broadcast           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ cart-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   money   │  │   entry   │  │   merge   │  │ snapshot  │  │   │
//! │  │   │   Money   │  │ LineEntry │  │ merge_add │  │  Cart-    │  │   │
//! │  │   │PriceScale │  │  LineKey  │  │ merge_sub │  │ Snapshot  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • PURE FUNCTIONS                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`entry`] - Requests, identity keys and the line-entry sum type
//! - [`merge`] - Pure merge algebra over entry lists
//! - [`snapshot`] - The immutable cart snapshot
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Network and file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are scaled integers to avoid float drift
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

pub mod entry;
pub mod error;
pub mod merge;
pub mod money;
pub mod snapshot;

// Re-exports for convenience: `use cart_core::Money` instead of
// `use cart_core::money::Money`.
pub use entry::{BundleEntry, BundleSubItem, ItemRequest, LineEntry, LineKey, SimpleEntry, SubItemRequest};
pub use error::{CartError, CartResult};
pub use merge::{merge_add, merge_subtract};
pub use money::{Money, PriceScale};
pub use snapshot::CartSnapshot;
