//! # cart-engine: The Async Cart Mutation Engine
//!
//! Owns the cart's single piece of shared mutable state - the current
//! [`cart_core::CartSnapshot`] - and everything concurrent around it:
//! serialized commits, the price-source seam, and the observer stream.
//!
//! ## What Lives Where
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          cart-engine                                    │
//! │                                                                         │
//! │  ┌─────────────┐  ┌──────────────┐  ┌─────────────────────────────┐    │
//! │  │ CartEngine  │  │ PriceSource  │  │ SnapshotStream              │    │
//! │  │             │◄─│ (host impls) │  │ replay-current, then every  │    │
//! │  │ add/remove/ │  │ network etc. │  │ commit in order             │    │
//! │  │ clear/reads │  └──────────────┘  └─────────────────────────────┘    │
//! │  └──────┬──────┘                                                       │
//! │         │ pure next-state computation                                  │
//! │  ┌──────▼──────────────────────────────────────────────────────────┐   │
//! │  │                 cart-core (merge algebra, money)                │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//! ```rust,ignore
//! use cart_engine::{CartEngine, EngineConfig};
//! use cart_core::ItemRequest;
//!
//! let engine = CartEngine::new(my_catalog, EngineConfig::default());
//! let mut stream = engine.observe();          // replays the empty snapshot
//!
//! engine.add(&ItemRequest::simple("tea"), 2).await?;
//! engine.add(&ItemRequest::simple("tea"), 1).await?;  // no lookup: merges
//!
//! assert_eq!(engine.count_for(&ItemRequest::simple("tea")), 3);
//! ```

pub mod config;
pub mod engine;
pub mod source;

pub use config::{EngineConfig, DEFAULT_EVENT_CAPACITY};
pub use engine::{CartEngine, SnapshotStream};
pub use source::{PriceSource, SubItemPrice};

// The pure layer is part of this crate's public vocabulary.
pub use cart_core::{
    CartError, CartResult, CartSnapshot, ItemRequest, LineEntry, LineKey, Money, PriceScale,
    SubItemRequest,
};
