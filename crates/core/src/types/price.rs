//! Type-safe price representation using decimal arithmetic.
//!
//! Catalog prices arrive as JSON numbers; they are held as [`Decimal`] so
//! cart totals and checkout math never accumulate float drift.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a price in US dollars, the catalog's only currency.
    #[must_use]
    pub const fn usd(amount: Decimal) -> Self {
        Self {
            amount,
            currency_code: CurrencyCode::USD,
        }
    }

    /// The amount rounded half away from zero to whole cents.
    #[must_use]
    pub fn rounded(&self) -> Decimal {
        round_to_cents(self.amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:.2}", self.currency_code.symbol(), self.rounded())
    }
}

/// Round a monetary amount half away from zero to two decimal places.
#[must_use]
pub fn round_to_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// ISO 4217 currency codes the catalog prices in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::USD => "$",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_formats_two_decimals() {
        assert_eq!(Price::usd(Decimal::new(999, 2)).to_string(), "$9.99");
        assert_eq!(Price::usd(Decimal::from(50)).to_string(), "$50.00");
        assert_eq!(Price::usd(Decimal::new(12345, 3)).to_string(), "$12.35");
    }

    #[test]
    fn test_round_to_cents_midpoint_away_from_zero() {
        assert_eq!(round_to_cents(Decimal::new(1005, 3)), Decimal::new(101, 2));
        assert_eq!(round_to_cents(Decimal::new(1004, 3)), Decimal::new(100, 2));
    }
}
