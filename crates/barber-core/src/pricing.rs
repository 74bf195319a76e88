//! # Pricing Calculator
//!
//! Derives VAT, gross total and barber commission from a base price.
//!
//! ## Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  vat_amount  = base_price × vat_rate            (23% by default)        │
//! │  total_price = base_price + vat_amount                                  │
//! │  commission  = base_price × commission_rate     (20% by default)        │
//! │                                                                         │
//! │  Intermediates stay exact (ExactAmount). A line of N units is the       │
//! │  per-unit exact breakdown × N, rounded half-up ONCE at the end:         │
//! │                                                                         │
//! │    unit ──► exact ──► × quantity ──► round ──► PriceBreakdown           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Commission is taken on the base price, never on the VAT-inclusive total.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::{ExactAmount, Money, Rate};
use crate::{DEFAULT_COMMISSION_RATE_BPS, DEFAULT_VAT_RATE_BPS, MAX_BASE_PRICE_CENTS, MAX_ITEM_QUANTITY};

// =============================================================================
// Configuration
// =============================================================================

/// Rates the calculator applies. Fixed for the lifetime of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingConfig {
    pub vat_rate: Rate,
    pub commission_rate: Rate,
}

impl Default for PricingConfig {
    fn default() -> Self {
        PricingConfig {
            vat_rate: Rate::from_bps(DEFAULT_VAT_RATE_BPS),
            commission_rate: Rate::from_bps(DEFAULT_COMMISSION_RATE_BPS),
        }
    }
}

impl PricingConfig {
    /// Builds a config from raw basis points.
    pub fn from_bps(vat_rate_bps: u32, commission_rate_bps: u32) -> Self {
        PricingConfig {
            vat_rate: Rate::from_bps(vat_rate_bps),
            commission_rate: Rate::from_bps(commission_rate_bps),
        }
    }

    /// Rejects rates above 100%.
    pub fn validate(&self) -> CoreResult<()> {
        if !self.vat_rate.is_at_most_whole() {
            return Err(CoreError::invalid_input(format!(
                "VAT rate {} exceeds 100%",
                self.vat_rate
            )));
        }
        if !self.commission_rate.is_at_most_whole() {
            return Err(CoreError::invalid_input(format!(
                "commission rate {} exceeds 100%",
                self.commission_rate
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Breakdown
// =============================================================================

/// Rounded monetary breakdown of a sale line, as persisted on the record.
///
/// `total_price == base_price + vat_amount` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceBreakdown {
    pub base_price: Money,
    pub vat_amount: Money,
    pub total_price: Money,
    pub commission: Money,
}

impl PriceBreakdown {
    /// Every amount negated. Used for reversal records.
    pub fn negated(&self) -> Self {
        PriceBreakdown {
            base_price: -self.base_price,
            vat_amount: -self.vat_amount,
            total_price: -self.total_price,
            commission: -self.commission,
        }
    }
}

/// Full-precision breakdown. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExactBreakdown {
    pub base_price: ExactAmount,
    pub vat_amount: ExactAmount,
    pub commission: ExactAmount,
}

impl ExactBreakdown {
    /// Scales every component by `quantity` without rounding.
    pub fn scale(&self, quantity: i64) -> Self {
        ExactBreakdown {
            base_price: self.base_price * quantity,
            vat_amount: self.vat_amount * quantity,
            commission: self.commission * quantity,
        }
    }

    /// Rounds each component half-up.
    ///
    /// The total is summed from the rounded parts so the persisted record is
    /// internally consistent.
    pub fn round(&self) -> PriceBreakdown {
        let base_price = self.base_price.round_half_up();
        let vat_amount = self.vat_amount.round_half_up();
        PriceBreakdown {
            base_price,
            vat_amount,
            total_price: base_price + vat_amount,
            commission: self.commission.round_half_up(),
        }
    }
}

// =============================================================================
// Calculator
// =============================================================================

/// Pure pricing function over a validated [`PricingConfig`].
#[derive(Debug, Clone, Copy)]
pub struct PricingCalculator {
    config: PricingConfig,
}

impl PricingCalculator {
    /// Creates a calculator, rejecting invalid rates.
    pub fn new(config: PricingConfig) -> CoreResult<Self> {
        config.validate()?;
        Ok(PricingCalculator { config })
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Exact breakdown of one unit.
    pub fn exact_breakdown(&self, base_price: Money) -> CoreResult<ExactBreakdown> {
        check_base_price(base_price)?;
        Ok(ExactBreakdown {
            base_price: ExactAmount::from_money(base_price),
            vat_amount: ExactAmount::percentage_of(base_price, self.config.vat_rate),
            commission: ExactAmount::percentage_of(base_price, self.config.commission_rate),
        })
    }

    /// Rounded breakdown of one unit.
    ///
    /// ## Example
    /// ```rust
    /// use barber_core::money::Money;
    /// use barber_core::pricing::{PricingCalculator, PricingConfig};
    ///
    /// let calc = PricingCalculator::new(PricingConfig::default()).unwrap();
    /// let b = calc.compute_breakdown(Money::from_cents(2500)).unwrap();
    /// assert_eq!(b.total_price.cents(), 3075);
    /// assert_eq!(b.commission.cents(), 500);
    /// ```
    pub fn compute_breakdown(&self, base_price: Money) -> CoreResult<PriceBreakdown> {
        Ok(self.exact_breakdown(base_price)?.round())
    }

    /// Rounded breakdown of `quantity` units at `unit_price`.
    ///
    /// Scales the exact per-unit breakdown, then rounds once.
    pub fn line_breakdown(&self, unit_price: Money, quantity: i64) -> CoreResult<PriceBreakdown> {
        if !(1..=MAX_ITEM_QUANTITY).contains(&quantity) {
            return Err(CoreError::invalid_input(format!(
                "quantity must be between 1 and {}, got {}",
                MAX_ITEM_QUANTITY, quantity
            )));
        }
        Ok(self.exact_breakdown(unit_price)?.scale(quantity).round())
    }
}

fn check_base_price(base_price: Money) -> CoreResult<()> {
    if base_price.is_negative() {
        return Err(CoreError::invalid_input(format!(
            "base price must not be negative, got {}",
            base_price
        )));
    }
    if base_price.cents() > MAX_BASE_PRICE_CENTS {
        return Err(CoreError::invalid_input(format!(
            "base price {} exceeds the maximum of {}",
            base_price,
            Money::from_cents(MAX_BASE_PRICE_CENTS)
        )));
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn calc() -> PricingCalculator {
        PricingCalculator::new(PricingConfig::default()).unwrap()
    }

    #[test]
    fn test_haircut_breakdown() {
        let b = calc().compute_breakdown(Money::from_cents(3500)).unwrap();
        assert_eq!(b.base_price.cents(), 3500);
        assert_eq!(b.vat_amount.cents(), 805);
        assert_eq!(b.total_price.cents(), 4305);
        assert_eq!(b.commission.cents(), 700);
    }

    #[test]
    fn test_product_line_of_three() {
        let b = calc().line_breakdown(Money::from_cents(2000), 3).unwrap();
        assert_eq!(b.base_price.cents(), 6000);
        assert_eq!(b.vat_amount.cents(), 1380);
        assert_eq!(b.total_price.cents(), 7380);
        assert_eq!(b.commission.cents(), 1200);
    }

    #[test]
    fn test_line_rounds_once_after_scaling() {
        // 0.15 × 23% = 3.45 per unit; two units = 6.9 → 7
        let b = calc().line_breakdown(Money::from_cents(15), 2).unwrap();
        assert_eq!(b.vat_amount.cents(), 7);
        assert_eq!(b.total_price.cents(), 37);
    }

    #[test]
    fn test_zero_price() {
        let b = calc().compute_breakdown(Money::zero()).unwrap();
        assert_eq!(b, PriceBreakdown::default());
    }

    #[test]
    fn test_rejects_negative_and_huge_prices() {
        assert!(calc().compute_breakdown(Money::from_cents(-1)).is_err());
        assert!(calc()
            .compute_breakdown(Money::from_cents(MAX_BASE_PRICE_CENTS + 1))
            .is_err());
        assert!(calc()
            .compute_breakdown(Money::from_cents(MAX_BASE_PRICE_CENTS))
            .is_ok());
    }

    #[test]
    fn test_rejects_bad_quantity() {
        assert!(calc().line_breakdown(Money::from_cents(100), 0).is_err());
        assert!(calc()
            .line_breakdown(Money::from_cents(100), MAX_ITEM_QUANTITY + 1)
            .is_err());
    }

    #[test]
    fn test_rejects_rates_over_100_percent() {
        assert!(PricingCalculator::new(PricingConfig::from_bps(10_001, 2000)).is_err());
        assert!(PricingCalculator::new(PricingConfig::from_bps(2300, 10_001)).is_err());
        assert!(PricingCalculator::new(PricingConfig::from_bps(10_000, 0)).is_ok());
    }

    #[test]
    fn test_breakdown_identities_hold_across_prices() {
        let calc = calc();
        for cents in (0..=20_000).step_by(7) {
            let b = calc.compute_breakdown(Money::from_cents(cents)).unwrap();
            assert_eq!(b.total_price, b.base_price + b.vat_amount);
            assert_eq!(b.vat_amount.cents(), (cents * 2300 + 5000) / 10_000);
            assert_eq!(b.commission.cents(), (cents * 2000 + 5000) / 10_000);
        }
    }

    #[test]
    fn test_negated() {
        let b = calc().compute_breakdown(Money::from_cents(3500)).unwrap();
        let n = b.negated();
        assert_eq!(n.total_price.cents(), -4305);
        assert_eq!(n.commission.cents(), -700);
        assert_eq!(n.total_price, n.base_price + n.vat_amount);
    }
}
