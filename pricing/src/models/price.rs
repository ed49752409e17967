//! Catalog price entities

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::PricingError;
use crate::frequency::BillingPeriod;
use crate::money::Money;

/// Wire value of one-off prices
pub const PRICE_TYPE_ONE_TIME: &str = "one_time";
/// Wire value of subscription prices
pub const PRICE_TYPE_RECURRING: &str = "recurring";

/// How a price turns a quantity into an amount
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingModel {
    /// One tier priced for the whole quantity
    TieredVolume,
    /// Every tier priced for its own slice of the quantity
    TieredGraduated,
    /// One tier's flat fee, independent of the quantity
    TieredFlatFee,
    /// Per-unit pricing over an externally supplied fee amount
    ExternalDynamicTariff,
    /// Per-unit pricing over a GetAG-supplied fee amount
    ExternalGetAg,
    /// Unit amount times quantity. Unknown wire values land here too.
    /// Kept last: the catch-all variant must close the enum.
    #[default]
    #[serde(other)]
    PerUnit,
}

/// One tax entry as carried on prices and items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tax {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Percentage rate (19 = 19%)
    #[serde(with = "rust_decimal::serde::float")]
    pub rate: Decimal,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub tax_type: Option<String>,
}

/// Resolved tax treatment for one computation
#[derive(Debug, Clone, PartialEq)]
pub enum ApplicableTax {
    /// No tax information on the override, the item, or the price
    Unspecified,
    /// An empty tax list was given on purpose; stops the fallback chain
    Nontaxable,
    /// Taxed at the entry's percentage rate
    Rate(Tax),
}

impl ApplicableTax {
    pub fn rate(&self) -> Option<Decimal> {
        match self {
            Self::Rate(tax) => Some(tax.rate),
            _ => None,
        }
    }
}

/// One pricing tier. Bounds are cumulative and ascending; the last tier may
/// omit `up_to` to be unbounded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceTier {
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub up_to: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_amount: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_amount_decimal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flat_fee_amount: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flat_fee_amount_decimal: Option<String>,
}

impl PriceTier {
    /// Per-unit amount of this tier as money
    pub fn unit_amount_money(&self, currency: &str) -> Result<Money, PricingError> {
        amount_from_parts(self.unit_amount, self.unit_amount_decimal.as_deref(), currency)
    }

    /// Flat fee of this tier as money
    pub fn flat_fee_money(&self, currency: &str) -> Result<Money, PricingError> {
        amount_from_parts(
            self.flat_fee_amount,
            self.flat_fee_amount_decimal.as_deref(),
            currency,
        )
    }
}

/// Money from a cents/decimal-string field pair. The decimal string is the
/// authoritative value; the integer is its rounded display twin.
pub(crate) fn amount_from_parts(
    units: Option<i64>,
    decimal: Option<&str>,
    currency: &str,
) -> Result<Money, PricingError> {
    match decimal {
        Some(value) => Money::from_decimal_str(value, currency),
        None => Ok(Money::from_minor_units(units.unwrap_or(0), currency)),
    }
}

/// Quantity override carried outside the line item, in its own frequency
/// unit (e.g. a yearly consumption estimate on a monthly price)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceInputMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_id: Option<String>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_unit: Option<String>,
}

/// Fee amount coming from an external system, in that system's billing
/// period
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalFeeMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_total_decimal: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Catalog price snapshot attached to a line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Missing or unknown models price per unit
    #[serde(default)]
    pub pricing_model: PricingModel,
    /// "one_time", "recurring", or any passthrough value
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub price_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_amount: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_amount_decimal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_amount_currency: Option<String>,
    /// Listed amounts contain tax unless stated otherwise
    #[serde(default = "default_true")]
    pub is_tax_inclusive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiers: Option<Vec<PriceTier>>,
    /// Applicable tax rates; only the first entry is applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax: Option<Vec<Tax>>,
}

impl Default for Price {
    fn default() -> Self {
        Self {
            id: None,
            description: None,
            pricing_model: PricingModel::default(),
            price_type: None,
            billing_period: None,
            unit_amount: None,
            unit_amount_decimal: None,
            unit_amount_currency: None,
            is_tax_inclusive: true,
            tiers: None,
            tax: None,
        }
    }
}

impl Price {
    pub fn is_recurring(&self) -> bool {
        self.price_type.as_deref() == Some(PRICE_TYPE_RECURRING)
    }

    /// Billing period as a recognized frequency, if it is one
    pub fn billing_period_parsed(&self) -> Option<BillingPeriod> {
        self.billing_period.as_deref().and_then(BillingPeriod::parse)
    }
}

// ==================== Tests ====================
