//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A 10% coupon on a €33.35 reservation must never produce                │
//! │  €3.3350000000000004 of discount.                                       │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Totals, coupon amounts, and applied discounts are all i64 cents.    │
//! │    Percentage rates are basis points (1000 bps = 10%).                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use boxoffice_core::money::Money;
//!
//! // Create from cents (preferred)
//! let total = Money::from_cents(10_000); // $100.00
//!
//! // 10% of the total, in basis points
//! let cut = total.percentage(1_000);
//! assert_eq!(cut.cents(), 1_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values; a percentage coupon over 100%
///   intentionally drives a total negative (see [`crate::pricing`])
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use boxoffice_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
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

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Calculates a percentage share of this value.
    ///
    /// ## Arguments
    /// * `bps` - Rate in basis points (1 bps = 0.01%, so 1000 = 10%)
    ///
    /// ## Implementation
    /// Integer math with half-up rounding: `(cents * bps + 5000) / 10000`.
    /// i128 intermediates prevent overflow on large totals.
    ///
    /// ## Example
    /// ```rust
    /// use boxoffice_core::money::Money;
    ///
    /// let total = Money::from_cents(10_000); // $100.00
    /// assert_eq!(total.percentage(1_000).cents(), 1_000); // 10% = $10.00
    /// assert_eq!(total.percentage(15_000).cents(), 15_000); // 150% = $150.00
    /// ```
    pub fn percentage(&self, bps: i64) -> Money {
        let share = (self.0 as i128 * bps as i128 + 5_000) / 10_000;
        Money::from_cents(share as i64)
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use boxoffice_core::money::Money;
    ///
    /// let per_ticket = Money::from_cents(500); // $5.00 off each ticket
    /// assert_eq!(per_ticket.multiply_quantity(3).cents(), 1500);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Returns this value floored at zero.
    ///
    /// Used by the fixed-price discount branch: a $10 reservation with a
    /// $1000 coupon ends at $0.00, not -$990.00.
    #[inline]
    pub fn floor_at_zero(self) -> Self {
        if self.0 < 0 {
            Money::zero()
        } else {
            self
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for debugging and logs. Actual customer-facing formatting is a
/// presentation concern outside this crate.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, (self.0 / 100).abs(), (self.0 % 100).abs())
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

/// Multiplication by i64 (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
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
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        let result: Money = a * 3;
        assert_eq!(result.cents(), 3000);
    }

    #[test]
    fn test_percentage_basic() {
        // 10% of $100.00 = $10.00
        let total = Money::from_cents(10_000);
        assert_eq!(total.percentage(1_000).cents(), 1_000);
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        // 8.25% of $10.00 = $0.825 → 83 cents
        let total = Money::from_cents(1_000);
        assert_eq!(total.percentage(825).cents(), 83);
    }

    #[test]
    fn test_percentage_over_one_hundred() {
        // 150% of $100.00 = $150.00, larger than the base value
        let total = Money::from_cents(10_000);
        assert_eq!(total.percentage(15_000).cents(), 15_000);
    }

    #[test]
    fn test_floor_at_zero() {
        assert_eq!(Money::from_cents(-990).floor_at_zero().cents(), 0);
        assert_eq!(Money::from_cents(990).floor_at_zero().cents(), 990);
        assert_eq!(Money::zero().floor_at_zero().cents(), 0);
    }

    #[test]
    fn test_multiply_quantity() {
        let per_ticket = Money::from_cents(500);
        assert_eq!(per_ticket.multiply_quantity(3).cents(), 1500);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let negative = Money::from_cents(-100);
        assert!(negative.is_negative());
    }
}
