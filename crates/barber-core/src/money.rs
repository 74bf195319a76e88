//! # Money Module
//!
//! Provides the `Money`, `Rate` and `ExactAmount` types for handling
//! monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    35.0 × 0.23 = 8.049999999999999  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents × Integer Basis Points                     │
//! │    3500 cents × 2300 bps = 8_050_000  (exact, in 1/10000 cent)          │
//! │    Rounded once, half-up: 805 cents = 8.05                              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use barber_core::money::{ExactAmount, Money, Rate};
//!
//! let price = Money::from_cents(2000); // 20.00
//! let vat = ExactAmount::percentage_of(price, Rate::from_bps(2300));
//!
//! // Scale by quantity BEFORE rounding
//! assert_eq!((vat * 3).round_half_up().cents(), 1380);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

/// Number of basis points in 100%.
pub const BPS_SCALE: i64 = 10_000;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for reversal records
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **No currency**: the shop runs a single currency, symbols are a
///   presentation concern
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  ServiceDefinition.base_price ──► PriceBreakdown ──► TransactionRecord │
/// │                                                          │              │
/// │  AggregateWindow.total_revenue ◄── Σ total_price ◄───────┘              │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use barber_core::money::Money;
    ///
    /// let price = Money::from_cents(3500); // Represents 35.00
    /// assert_eq!(price.cents(), 3500);
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

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }
}

/// Shows money as `major.minor` without a currency symbol.
///
/// ## Note
/// This is for logs and the CLI. Dashboards format with their own locale.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

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

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Rate
// =============================================================================

/// A percentage rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 2300 bps = 23% (VAT), 2000 bps = 20% (commission)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rate(u32);

impl Rate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// True when the rate is at most 100%.
    #[inline]
    pub const fn is_at_most_whole(&self) -> bool {
        self.0 as i64 <= BPS_SCALE
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

// =============================================================================
// Exact Amount
// =============================================================================

/// A monetary amount kept at full precision, in 1/10000 of a cent.
///
/// `cents × bps` is always an exact integer in this unit, so VAT and
/// commission can be carried through quantity scaling without losing
/// anything. Only [`ExactAmount::round_half_up`] converts back to `Money`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct ExactAmount(i128);

impl ExactAmount {
    /// The exact value of a whole `Money` amount.
    #[inline]
    pub fn from_money(money: Money) -> Self {
        ExactAmount(money.cents() as i128 * BPS_SCALE as i128)
    }

    /// `amount × rate`, exactly.
    #[inline]
    pub fn percentage_of(amount: Money, rate: Rate) -> Self {
        ExactAmount(amount.cents() as i128 * rate.bps() as i128)
    }

    /// Raw value in 1/10000 cent units.
    #[inline]
    pub const fn raw(&self) -> i128 {
        self.0
    }

    /// Rounds to whole cents, half away from zero.
    ///
    /// ## Example
    /// ```rust
    /// use barber_core::money::{ExactAmount, Money, Rate};
    ///
    /// // 0.825 cents of tax → 1 cent
    /// let tax = ExactAmount::percentage_of(Money::from_cents(10), Rate::from_bps(825));
    /// assert_eq!(tax.round_half_up().cents(), 1);
    /// ```
    pub fn round_half_up(&self) -> Money {
        let scale = BPS_SCALE as i128;
        let half = scale / 2;
        let cents = if self.0 >= 0 {
            (self.0 + half) / scale
        } else {
            -((-self.0 + half) / scale)
        };
        Money::from_cents(cents as i64)
    }
}

impl Add for ExactAmount {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        ExactAmount(self.0 + other.0)
    }
}

impl Mul<i64> for ExactAmount {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        ExactAmount(self.0 * qty as i128)
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
        let money = Money::from_cents(4305);
        assert_eq!(money.cents(), 4305);
        assert_eq!(money.major(), 43);
        assert_eq!(money.minor(), 5);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(4305).to_string(), "43.05");
        assert_eq!(Money::from_cents(700).to_string(), "7.00");
        assert_eq!(Money::from_cents(-4305).to_string(), "-43.05");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);
        assert_eq!((-a).cents(), -1000);
        assert_eq!(vec![a, b, -b].into_iter().sum::<Money>(), a);
    }

    #[test]
    fn test_rate_display() {
        assert_eq!(Rate::from_bps(2300).to_string(), "23.00%");
        assert_eq!(Rate::from_bps(825).to_string(), "8.25%");
        assert!(Rate::from_bps(10_000).is_at_most_whole());
        assert!(!Rate::from_bps(10_001).is_at_most_whole());
    }

    #[test]
    fn test_exact_amount_keeps_precision_until_rounding() {
        // 0.05 × 23% = 1.15 cents per unit
        let per_unit = ExactAmount::percentage_of(Money::from_cents(5), Rate::from_bps(2300));
        assert_eq!(per_unit.round_half_up().cents(), 1);
        assert_eq!((per_unit * 3).round_half_up().cents(), 3);

        // 0.15 × 23% = 3.45 cents; × 2 = 6.9 → 7, while 3 + 3 would be 6
        let per_unit = ExactAmount::percentage_of(Money::from_cents(15), Rate::from_bps(2300));
        assert_eq!(per_unit.round_half_up().cents(), 3);
        assert_eq!((per_unit * 2).round_half_up().cents(), 7);
    }

    #[test]
    fn test_round_half_up_at_exact_half() {
        // 0.5 cent rounds up, -0.5 cent rounds away from zero
        assert_eq!(ExactAmount(5_000).round_half_up().cents(), 1);
        assert_eq!(ExactAmount(4_999).round_half_up().cents(), 0);
        assert_eq!(ExactAmount(-5_000).round_half_up().cents(), -1);
    }

    #[test]
    fn test_exact_from_money() {
        let exact = ExactAmount::from_money(Money::from_cents(3500));
        assert_eq!(exact.raw(), 35_000_000);
        assert_eq!(exact.round_half_up().cents(), 3500);
    }
}
