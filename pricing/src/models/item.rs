//! Line items and their computed amounts
//!
//! `PriceItem` is both input and output: callers hand in the snapshot
//! fields (`_price`, `_product`, `_coupons`, quantity, tax overrides) and
//! the calculator returns a copy with every computed field filled in.
//! Integer amounts are 2-decimal minor units; each carries a full-precision
//! decimal-string twin.

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

use super::coupon::Coupon;
use super::price::{Price, Tax};

/// One bucket of a tax breakdown. `tax` is absent for the nontaxable bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxAmount {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax: Option<Tax>,
    #[serde(default)]
    pub amount: i64,
}

/// Per-tier amounts reported alongside tiered computations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TierDetail {
    /// Quantity priced by this tier
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
    pub unit_amount: i64,
    pub unit_amount_decimal: String,
    pub unit_amount_net: i64,
    pub unit_amount_gross: i64,
    pub amount_subtotal: i64,
    pub amount_total: i64,
    pub amount_tax: i64,
}

/// Product snapshot carried for grouping and display
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "_tags", default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// A line item before and after computation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceItem {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub quantity: Option<Decimal>,
    #[serde(rename = "_price", default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(rename = "_product", default, skip_serializing_if = "Option::is_none")]
    pub product: Option<Product>,
    #[serde(rename = "_coupons", default, skip_serializing_if = "Option::is_none")]
    pub coupons: Option<Vec<Coupon>>,
    /// Tax override on input (an empty list means explicitly nontaxable);
    /// resolved single-bucket breakdown on output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxes: Option<Vec<TaxAmount>>,

    /// Listed per-unit amount in minor units
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_amount: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_amount_decimal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_amount_net: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_amount_gross: Option<i64>,
    /// Net amount in minor units
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_subtotal: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_subtotal_decimal: Option<String>,
    /// Gross amount in minor units
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_total: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_total_decimal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_tax: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_tax_decimal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// Echo of the price type; unknown values pass through untouched
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
    /// Only present for recurring items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_tax_inclusive: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiers_details: Option<Vec<TierDetail>>,

    /// Listed unit amount before a discount was taken; its presence marks
    /// the item as already discounted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_discount_unit_amount: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_discount_unit_amount_decimal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_discount_amount_total: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_discount_amount_total_decimal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_amount: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_amount_decimal: Option<String>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub discount_percentage: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cashback_amount: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cashback_amount_decimal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cashback_period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_cashback_amount_total: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_cashback_amount_total_decimal: Option<String>,

    /// Component items of a composite; each computes against its own price
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_components: Option<Vec<PriceItem>>,
}

impl PriceItem {
    /// Whether a previous computation already applied a discount
    pub fn is_discounted(&self) -> bool {
        self.before_discount_unit_amount.is_some()
            || self.before_discount_unit_amount_decimal.is_some()
    }

    pub fn is_composite(&self) -> bool {
        self.item_components.is_some()
    }
}

// ==================== Tests ====================
