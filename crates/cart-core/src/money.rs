//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely, plus the
//! `PriceScale` used to convert adapter-supplied decimal prices into it.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Accumulate a few hundred line totals that way and the published       │
//! │  cart total no longer equals the literal sum of its lines.             │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Minor Units                                      │
//! │    Convert ONCE at the adapter boundary (round(price * scale)),        │
//! │    then every add/subtract/multiply stays in exact integer math.       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use cart_core::money::{Money, PriceScale};
//!
//! // Create from minor units (preferred)
//! let price = Money::from_minor_units(1099); // 10.99 at the default scale
//!
//! // Convert an adapter's decimal price exactly once
//! let scale = PriceScale::default(); // 100 = two fractional digits
//! assert_eq!(scale.to_minor(10.99), price);
//!
//! // Arithmetic stays in the integer domain
//! let line_total = price * 3;
//! assert_eq!(line_total.minor_units(), 3297);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents for USD).
///
/// ## Design Decisions
/// - **i64 (signed)**: intermediate subtraction results may dip negative
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
///
/// Every monetary value in the engine flows through this type: unit prices,
/// line totals, and the snapshot total. The scale (how many minor units make
/// one major unit) is carried separately by [`PriceScale`] and only matters
/// at the conversion boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use cart_core::money::Money;
    ///
    /// let price = Money::from_minor_units(1099); // 10.99 at scale 100
    /// assert_eq!(price.minor_units(), 1099);
    /// ```
    #[inline]
    pub const fn from_minor_units(minor: i64) -> Self {
        Money(minor)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor_units(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use cart_core::money::Money;
    ///
    /// let unit_price = Money::from_minor_units(299);
    /// let line_total = unit_price.multiply_quantity(3);
    /// assert_eq!(line_total.minor_units(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Price Scale
// =============================================================================

/// Number of minor units per major unit (100 = two fractional digits).
///
/// ## Why Explicit?
/// The conversion factor between an adapter's decimal price and the integer
/// representation used everywhere else is configuration, not an ambient
/// constant baked into call sites. It is passed to the engine at
/// construction and applied exactly once per resolved price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceScale(u32);

impl PriceScale {
    /// Creates a scale from the raw factor (100 = two fractional digits).
    #[inline]
    pub const fn new(factor: u32) -> Self {
        PriceScale(factor)
    }

    /// Creates a scale from a number of fractional digits (2 → 100).
    pub fn from_fraction_digits(digits: u32) -> Self {
        PriceScale(10u32.pow(digits))
    }

    /// Returns the raw conversion factor.
    #[inline]
    pub const fn factor(&self) -> u32 {
        self.0
    }

    /// Converts a decimal price into minor units: `round(price * scale)`.
    ///
    /// This is the ONLY place a floating-point price touches the system;
    /// everything downstream is exact integer arithmetic. Convert first,
    /// multiply by counts after - never the other way around.
    ///
    /// ## Example
    /// ```rust
    /// use cart_core::money::PriceScale;
    ///
    /// let scale = PriceScale::default();
    /// assert_eq!(scale.to_minor(1.75).minor_units(), 175);
    /// assert_eq!(scale.to_minor(0.115).minor_units(), 12); // rounded, not truncated
    /// ```
    pub fn to_minor(&self, price: f64) -> Money {
        Money::from_minor_units((price * self.0 as f64).round() as i64)
    }

    /// Converts minor units back to a decimal value.
    ///
    /// For display at the read boundary only. Never feed the result back
    /// into a calculation.
    pub fn to_decimal(&self, money: Money) -> f64 {
        money.minor_units() as f64 / self.0 as f64
    }
}

/// Default scale is 100: two fractional digits, the common currency case.
impl Default for PriceScale {
    fn default() -> Self {
        PriceScale(100)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for debugging and assumes the default two-digit scale. Use
/// [`PriceScale::to_decimal`] plus host-side formatting for actual UI
/// display to handle localization properly.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, (self.0 / 100).abs(), (self.0 % 100).abs())
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by integer (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

/// Summation over an iterator of Money (snapshot totals).
impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
