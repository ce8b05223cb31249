//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                          │
//! │                                                                      │
//! │  In floating point:                                                  │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                         │
//! │                                                                      │
//! │  The original system stored DECIMAL(10,2) and did float math in      │
//! │  application code. We keep every amount in integer cents instead:    │
//! │    subtotal, tax, discount, totals, unit prices - all i64 cents.     │
//! │                                                                      │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use emporium_core::money::Money;
//!
//! let unit = Money::from_cents(1000);
//! let line = unit.multiply_quantity(2);
//! assert_eq!(line.cents(), 2000);
//!
//! // Order totals never go below zero, however large the discount:
//! let total = (line + Money::from_cents(0) - Money::from_cents(5000)).clamp_non_negative();
//! assert_eq!(total.cents(), 0);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: intermediate values (subtotal − discount) may dip
///   below zero before clamping
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Derives**: full serde support for JSON serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
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

    /// Checks if the value is strictly positive.
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit price by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use emporium_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Floors the value at zero.
    ///
    /// Order totals are `subtotal + tax - discount`; a discount larger than
    /// the rest of the order must not produce a negative grand total.
    #[inline]
    pub const fn clamp_non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            *self
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// For debugging and log output; any UI formats amounts itself.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by i64 (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Order Total Computation
// =============================================================================

/// Computes an order's grand total from its parts.
///
/// `total = max(0, subtotal + tax - discount)`
///
/// This is THE formula for `Order::total_cents`; totals are always recomputed
/// from the items, never hand-edited independently of them.
///
/// ## Example
/// ```rust
/// use emporium_core::money::{grand_total, Money};
///
/// let total = grand_total(
///     Money::from_cents(2500),
///     Money::from_cents(0),
///     Money::from_cents(0),
/// );
/// assert_eq!(total.cents(), 2500);
///
/// // A discount can never push the total below zero:
/// let total = grand_total(
///     Money::from_cents(1000),
///     Money::from_cents(100),
///     Money::from_cents(5000),
/// );
/// assert_eq!(total.cents(), 0);
/// ```
pub fn grand_total(subtotal: Money, tax: Money, discount: Money) -> Money {
    (subtotal + tax - discount).clamp_non_negative()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);
    }

    #[test]
    fn test_multiply_quantity() {
        let unit_price = Money::from_cents(299);
        assert_eq!(unit_price.multiply_quantity(3).cents(), 897);
    }

    #[test]
    fn test_clamp_non_negative() {
        assert_eq!(Money::from_cents(-100).clamp_non_negative().cents(), 0);
        assert_eq!(Money::from_cents(100).clamp_non_negative().cents(), 100);
        assert_eq!(Money::zero().clamp_non_negative().cents(), 0);
    }

    #[test]
    fn test_grand_total_basic() {
        // 2 x 1000 + 1 x 500, no tax, no discount
        let subtotal = Money::from_cents(2500);
        let total = grand_total(subtotal, Money::zero(), Money::zero());
        assert_eq!(total.cents(), 2500);
    }

    #[test]
    fn test_grand_total_with_tax_and_discount() {
        let total = grand_total(
            Money::from_cents(2000),
            Money::from_cents(160),
            Money::from_cents(500),
        );
        assert_eq!(total.cents(), 1660);
    }

    #[test]
    fn test_grand_total_floors_at_zero() {
        let total = grand_total(
            Money::from_cents(1000),
            Money::zero(),
            Money::from_cents(9999),
        );
        assert_eq!(total.cents(), 0);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        assert!(Money::from_cents(100).is_positive());
        assert!(Money::from_cents(-100).is_negative());
    }
}
