//! Money values with fixed-precision decimal arithmetic
//!
//! All computation runs on `Decimal` at full precision; rounding happens
//! only when a value leaves the computation as a minor-unit integer or a
//! decimal string. Every amount carries its currency code so cross-currency
//! arithmetic is rejected instead of silently mixing units.

use rust_decimal::prelude::*;

use crate::error::PricingError;

/// Fractional digits carried by decimal-string amounts
pub const DECIMAL_PRECISION: u32 = 12;

/// Fractional digits of exposed integer amounts (minor units)
pub const MINOR_UNIT_PLACES: u32 = 2;

/// Currency used when neither the price nor the caller provides one
pub const DEFAULT_CURRENCY: &str = "EUR";

/// Round a raw decimal half-up to 2-decimal minor units
pub fn to_cents(amount: Decimal) -> i64 {
    let scaled = amount.round_dp_with_strategy(MINOR_UNIT_PLACES, RoundingStrategy::MidpointAwayFromZero)
        * Decimal::from(10_i64.pow(MINOR_UNIT_PLACES));
    scaled.to_i64().unwrap_or_else(|| {
        tracing::error!(amount = %amount, "Amount out of integer range, defaulting to zero");
        0
    })
}

/// Full-precision decimal string for a raw decimal, trailing zeros trimmed
pub fn to_decimal_string(amount: Decimal) -> String {
    amount
        .round_dp_with_strategy(DECIMAL_PRECISION, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
        .to_string()
}

/// A monetary amount bound to a currency code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Money {
    amount: Decimal,
    currency: String,
}

impl Money {
    /// Create a money value from an exact decimal amount
    pub fn new(amount: Decimal, currency: &str) -> Self {
        Self {
            amount,
            currency: currency.to_uppercase(),
        }
    }

    /// Zero in the given currency
    pub fn zero(currency: &str) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    /// Parse a decimal string such as "10", "-0.05", or "18.181818181818"
    pub fn from_decimal_str(value: &str, currency: &str) -> Result<Self, PricingError> {
        let amount = value
            .trim()
            .parse::<Decimal>()
            .map_err(|_| PricingError::InvalidOperand(format!("not a decimal amount: {value:?}")))?;
        Ok(Self::new(amount, currency))
    }

    /// Build from an integer amount in 2-decimal minor units
    pub fn from_minor_units(units: i64, currency: &str) -> Self {
        Self::new(Decimal::new(units, MINOR_UNIT_PLACES), currency)
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn is_negative(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    fn require_same_currency(&self, other: &Money) -> Result<(), PricingError> {
        if self.currency != other.currency {
            return Err(PricingError::CurrencyMismatch {
                left: self.currency.clone(),
                right: other.currency.clone(),
            });
        }
        Ok(())
    }

    /// Add an amount of the same currency
    pub fn checked_add(&self, other: &Money) -> Result<Money, PricingError> {
        self.require_same_currency(other)?;
        Ok(Money::new(self.amount + other.amount, &self.currency))
    }

    /// Subtract an amount of the same currency
    pub fn checked_sub(&self, other: &Money) -> Result<Money, PricingError> {
        self.require_same_currency(other)?;
        Ok(Money::new(self.amount - other.amount, &self.currency))
    }

    /// Multiply by a dimensionless factor
    pub fn multiply(&self, factor: Decimal) -> Money {
        Money::new(self.amount * factor, &self.currency)
    }

    /// Divide by a dimensionless divisor
    pub fn divide(&self, divisor: Decimal) -> Result<Money, PricingError> {
        if divisor.is_zero() {
            return Err(PricingError::InvalidOperand("division by zero".to_string()));
        }
        Ok(Money::new(self.amount / divisor, &self.currency))
    }

    /// Clamp negative amounts to zero
    pub fn max_zero(&self) -> Money {
        Money::new(self.amount.max(Decimal::ZERO), &self.currency)
    }

    /// Round half-up to the given number of fractional digits
    pub fn convert_precision(&self, dp: u32) -> Money {
        Money::new(
            self.amount
                .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero),
            &self.currency,
        )
    }

    /// Integer amount in 2-decimal minor units, rounded half-up
    pub fn to_cents(&self) -> i64 {
        to_cents(self.amount)
    }

    /// Decimal string at full precision, trailing zeros trimmed
    pub fn to_decimal_string(&self) -> String {
        to_decimal_string(self.amount)
    }
}

// ==================== Tests ====================
