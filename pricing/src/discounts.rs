//! Coupon selection and application
//!
//! At most one coupon applies per item. Candidates are filtered for
//! structural validity and promo-code gating, ranked by category with
//! discounts ahead of cashbacks, and the first survivor is applied.
//! Discounts rewrite the item amounts; cashbacks leave them untouched and
//! only record what gets paid back later.

use rust_decimal::prelude::*;

use crate::error::PricingError;
use crate::models::{amount_from_parts, ApplicableTax, Coupon, CouponCategory, CouponType, RedeemedPromo};
use crate::money::Money;
use crate::tiers::{PriceComputationResult, TaxedAmount};

/// Inputs the coupon math needs beyond the resolved amounts
#[derive(Debug, Clone)]
pub struct CouponContext<'a> {
    /// Quantity multiplying fixed coupon values
    pub multiplier: Decimal,
    pub is_tax_inclusive: bool,
    pub tax: &'a ApplicableTax,
    pub currency: &'a str,
}

/// What applying one coupon did to an item
#[derive(Debug, Clone)]
pub struct CouponApplication {
    /// Amounts after the coupon; unchanged for cashbacks
    pub result: PriceComputationResult,
    /// Gross total before the discount was taken
    pub before_discount_amount_total: Option<Money>,
    /// Listed unit amount before the discount was taken
    pub before_discount_unit_amount: Option<Money>,
    /// Gross reduction the discount produced
    pub discount_amount: Option<Money>,
    /// Percentage applied, for percentage discounts
    pub discount_percentage: Option<Decimal>,
    /// Amount paid back later by a cashback coupon
    pub cashback_amount: Option<Money>,
    /// Payout period of the cashback; "0" pays out immediately
    pub cashback_period: Option<String>,
}

// ==================== Selection ====================

/// Pick the coupon to apply: structurally valid, unlocked, first in
/// category order with discounts ahead of cashbacks
pub fn select_coupon<'a>(
    coupons: &'a [Coupon],
    redeemed_promos: &[RedeemedPromo],
) -> Option<&'a Coupon> {
    let mut candidates: Vec<&Coupon> = coupons
        .iter()
        .filter(|coupon| {
            if !coupon.is_valid() {
                tracing::warn!(coupon_id = ?coupon.id, "Skipping structurally invalid coupon");
                return false;
            }
            !coupon.requires_promo_code || is_unlocked(coupon, redeemed_promos)
        })
        .collect();
    candidates.sort_by_key(|coupon| coupon.category);
    candidates.first().copied()
}

fn is_unlocked(coupon: &Coupon, redeemed_promos: &[RedeemedPromo]) -> bool {
    let Some(id) = coupon.id.as_deref() else {
        return false;
    };
    redeemed_promos
        .iter()
        .flat_map(|promo| promo.coupons.iter())
        .any(|unlocked| unlocked.id.as_deref() == Some(id))
}

// ==================== Application ====================

/// Apply one coupon to resolved amounts
pub fn apply_coupon(
    result: &PriceComputationResult,
    coupon: &Coupon,
    ctx: &CouponContext,
) -> Result<CouponApplication, PricingError> {
    match coupon.category {
        CouponCategory::Discount => apply_discount(result, coupon, ctx),
        CouponCategory::Cashback => apply_cashback(result, coupon, ctx),
    }
}

fn fixed_money(coupon: &Coupon, ctx: &CouponContext) -> Result<Money, PricingError> {
    amount_from_parts(
        coupon.fixed_value,
        coupon.fixed_value_decimal.as_deref(),
        coupon.fixed_value_currency.as_deref().unwrap_or(ctx.currency),
    )
}

fn percentage_of(amount: &Money, percentage: Decimal) -> Money {
    amount.multiply(percentage / Decimal::ONE_HUNDRED)
}

/// Subtract a reduction, never driving a positive base below zero. Negative
/// bases are reduced as-is.
fn subtract_floored(base: &Money, reduction: &Money) -> Result<Money, PricingError> {
    let reduced = base.checked_sub(reduction)?;
    if base.is_negative() {
        Ok(reduced)
    } else {
        Ok(reduced.max_zero())
    }
}

fn apply_discount(
    result: &PriceComputationResult,
    coupon: &Coupon,
    ctx: &CouponContext,
) -> Result<CouponApplication, PricingError> {
    // Discounts operate on the listed side of the price: gross when
    // tax-inclusive, net otherwise. The other side is re-derived.
    let listed_total = if ctx.is_tax_inclusive {
        &result.amount_total
    } else {
        &result.amount_subtotal
    };
    let unit_listed = &result.unit_amount;

    let (total_reduction, unit_reduction, discount_percentage) = match coupon.coupon_type {
        CouponType::Percentage => {
            let percentage = coupon.percentage_value.unwrap_or_default();
            (
                percentage_of(listed_total, percentage),
                percentage_of(unit_listed, percentage),
                Some(percentage),
            )
        }
        CouponType::Fixed => {
            let fixed = fixed_money(coupon, ctx)?;
            (fixed.multiply(ctx.multiplier), fixed, None)
        }
    };

    let discounted_total = subtract_floored(listed_total, &total_reduction)?;
    let discounted_unit = subtract_floored(unit_listed, &unit_reduction)?;
    let line = TaxedAmount::split(&discounted_total, ctx.is_tax_inclusive, ctx.tax);
    let unit = TaxedAmount::split(&discounted_unit, ctx.is_tax_inclusive, ctx.tax);
    let discount_amount = result.amount_total.checked_sub(&line.gross)?;

    Ok(CouponApplication {
        result: PriceComputationResult {
            unit_amount: discounted_unit,
            unit_amount_net: unit.net,
            unit_amount_gross: unit.gross,
            amount_subtotal: line.net,
            amount_total: line.gross,
            amount_tax: line.tax,
            tier_details: result.tier_details.clone(),
        },
        before_discount_amount_total: Some(result.amount_total.clone()),
        before_discount_unit_amount: Some(result.unit_amount.clone()),
        discount_amount: Some(discount_amount),
        discount_percentage,
        cashback_amount: None,
        cashback_period: None,
    })
}

fn apply_cashback(
    result: &PriceComputationResult,
    coupon: &Coupon,
    ctx: &CouponContext,
) -> Result<CouponApplication, PricingError> {
    let cashback = match coupon.coupon_type {
        CouponType::Percentage => {
            percentage_of(&result.amount_total, coupon.percentage_value.unwrap_or_default())
        }
        CouponType::Fixed => fixed_money(coupon, ctx)?.multiply(ctx.multiplier),
    }
    .max_zero();

    Ok(CouponApplication {
        result: result.clone(),
        before_discount_amount_total: None,
        before_discount_unit_amount: None,
        discount_amount: None,
        discount_percentage: None,
        cashback_amount: Some(cashback),
        cashback_period: Some(coupon.cashback_period.clone().unwrap_or_else(|| "0".to_string())),
    })
}

// ==================== Tests ====================
