//! Billing frequency normalization
//!
//! Converts amounts between billing frequencies using periods-per-year
//! ratios:
//! - weekly = 52, monthly = 12, every_quarter = 4, every_6_months = 2,
//!   yearly = 1
//! - monthly and weekly convert through a fixed four-weeks-per-month
//!   factor instead of the 52/12 ratio
//! - unrecognized frequency units fall back to a factor of one so unknown
//!   periods pass through unchanged

use rust_decimal::prelude::*;

use crate::error::PricingError;
use crate::money::DECIMAL_PRECISION;

/// Fractional digits kept when normalizing plain numeric values
pub const NUMERIC_PRECISION: u32 = 4;

/// Recognized billing frequencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BillingPeriod {
    Weekly,
    Monthly,
    EveryQuarter,
    Every6Months,
    Yearly,
}

impl BillingPeriod {
    /// Parse a wire frequency unit. Unknown units yield `None`, which every
    /// conversion treats as a factor-one no-op.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            "every_quarter" => Some(Self::EveryQuarter),
            "every_6_months" => Some(Self::Every6Months),
            "yearly" => Some(Self::Yearly),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::EveryQuarter => "every_quarter",
            Self::Every6Months => "every_6_months",
            Self::Yearly => "yearly",
        }
    }

    /// Number of billing periods in a year
    pub fn periods_per_year(&self) -> u32 {
        match self {
            Self::Weekly => 52,
            Self::Monthly => 12,
            Self::EveryQuarter => 4,
            Self::Every6Months => 2,
            Self::Yearly => 1,
        }
    }
}

/// Multiplier turning an amount per `from` period into an amount per `to`
/// period
pub fn conversion_factor(from: Option<BillingPeriod>, to: Option<BillingPeriod>) -> Decimal {
    use BillingPeriod::*;
    match (from, to) {
        // Four weeks per month by convention, not 52/12
        (Some(Monthly), Some(Weekly)) => Decimal::new(25, 2),
        (Some(Weekly), Some(Monthly)) => Decimal::from(4),
        (Some(from), Some(to)) => {
            Decimal::from(from.periods_per_year()) / Decimal::from(to.periods_per_year())
        }
        _ => {
            tracing::debug!(?from, ?to, "Unrecognized billing period, applying identity factor");
            Decimal::ONE
        }
    }
}

/// Normalize `value` from one billing frequency to another, rounded half-up
/// to `dp` fractional digits
pub fn normalize_value(
    value: Decimal,
    from: Option<BillingPeriod>,
    to: Option<BillingPeriod>,
    dp: u32,
) -> Decimal {
    (value * conversion_factor(from, to))
        .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Normalize a plain numeric value, kept at 4 fractional digits
pub fn normalize_numeric(
    value: Decimal,
    from: Option<BillingPeriod>,
    to: Option<BillingPeriod>,
) -> Decimal {
    normalize_value(value, from, to, NUMERIC_PRECISION)
}

/// Normalize a decimal-string value, kept at full precision
pub fn normalize_decimal_str(
    value: &str,
    from: Option<BillingPeriod>,
    to: Option<BillingPeriod>,
) -> Result<Decimal, PricingError> {
    let amount = value
        .trim()
        .parse::<Decimal>()
        .map_err(|_| PricingError::InvalidOperand(format!("not a decimal amount: {value:?}")))?;
    Ok(normalize_value(amount, from, to, DECIMAL_PRECISION))
}

// ==================== Tests ====================
