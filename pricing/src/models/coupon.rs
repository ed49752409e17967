//! Coupons and redeemed promo codes

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

/// What a coupon does to the amounts it applies to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponCategory {
    /// Reduces what the customer pays now; ranked before cashbacks
    #[default]
    Discount,
    /// Paid back later; the item amounts stay untouched
    Cashback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponType {
    Percentage,
    Fixed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub category: CouponCategory,
    #[serde(rename = "type")]
    pub coupon_type: CouponType,
    /// Percentage in (0, 100] for percentage coupons
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub percentage_value: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_value_decimal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_value_currency: Option<String>,
    /// Payout period for cashbacks; "0" pays out immediately
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cashback_period: Option<String>,
    /// Only applies when unlocked by a redeemed promo code
    #[serde(default)]
    pub requires_promo_code: bool,
}

impl Coupon {
    /// Whether the coupon carries enough data to be applied
    pub fn is_valid(&self) -> bool {
        match self.coupon_type {
            CouponType::Percentage => self
                .percentage_value
                .map(|value| value > Decimal::ZERO && value <= Decimal::ONE_HUNDRED)
                .unwrap_or(false),
            CouponType::Fixed => self.fixed_value.is_some() || self.fixed_value_decimal.is_some(),
        }
    }
}

/// A promo code the customer redeemed, unlocking the coupons behind it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RedeemedPromo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default)]
    pub coupons: Vec<Coupon>,
}

// ==================== Tests ====================
