//! Tiered pricing resolvers
//!
//! Resolves a quantity against a price's tiers and produces the amounts:
//! - volume: one tier covers the whole quantity
//! - graduated: every tier prices its own slice of the quantity
//! - flat fee: one tier's fixed amount, independent of the quantity
//!
//! Amounts follow the sign of the configured unit amounts; tier selection
//! only looks at quantities.

use rust_decimal::prelude::*;

use crate::error::PricingError;
use crate::models::{ApplicableTax, PriceTier, TierDetail};
use crate::money::Money;

/// Inputs shared by every tier resolver
#[derive(Debug, Clone)]
pub struct TierPricingParams<'a> {
    pub tiers: &'a [PriceTier],
    /// Quantity used to pick tiers (the mapped value when one is provided)
    pub quantity_to_select_tier: Decimal,
    /// Quantity the unit amount is multiplied by (mapped value times item
    /// quantity)
    pub unit_amount_multiplier: Decimal,
    /// Sanitized item quantity
    pub quantity: Decimal,
    /// Whether a price mapping picked the tier instead of the quantity
    pub is_using_price_mapping_to_select_tier: bool,
    pub currency: &'a str,
    pub is_tax_inclusive: bool,
    pub tax: &'a ApplicableTax,
}

/// Amounts produced by resolving one price
#[derive(Debug, Clone)]
pub struct PriceComputationResult {
    /// Listed per-unit amount
    pub unit_amount: Money,
    /// Per-unit amount without tax
    pub unit_amount_net: Money,
    /// Per-unit amount including tax
    pub unit_amount_gross: Money,
    /// Net amount
    pub amount_subtotal: Money,
    /// Gross amount
    pub amount_total: Money,
    /// Tax portion of the gross amount
    pub amount_tax: Money,
    /// Per-tier breakdown for tiered models
    pub tier_details: Option<Vec<TierDetail>>,
}

impl PriceComputationResult {
    pub fn zero(currency: &str) -> Self {
        Self {
            unit_amount: Money::zero(currency),
            unit_amount_net: Money::zero(currency),
            unit_amount_gross: Money::zero(currency),
            amount_subtotal: Money::zero(currency),
            amount_total: Money::zero(currency),
            amount_tax: Money::zero(currency),
            tier_details: None,
        }
    }
}

// ==================== Tax Split ====================

/// A listed amount split into its net, gross, and tax parts
#[derive(Debug, Clone)]
pub(crate) struct TaxedAmount {
    pub net: Money,
    pub gross: Money,
    pub tax: Money,
}

impl TaxedAmount {
    /// Split a listed amount per the tax mode. Tax-inclusive amounts are
    /// gross; tax-exclusive amounts are net.
    pub fn split(listed: &Money, is_tax_inclusive: bool, tax: &ApplicableTax) -> Self {
        let currency = listed.currency();
        let Some(rate) = tax.rate() else {
            return Self {
                net: listed.clone(),
                gross: listed.clone(),
                tax: Money::zero(currency),
            };
        };
        if is_tax_inclusive {
            let divisor = Decimal::ONE_HUNDRED + rate;
            let tax_amount = if divisor.is_zero() {
                Money::zero(currency)
            } else {
                Money::new(listed.amount() * rate / divisor, currency)
            };
            Self {
                net: Money::new(listed.amount() - tax_amount.amount(), currency),
                gross: listed.clone(),
                tax: tax_amount,
            }
        } else {
            let tax_amount = Money::new(listed.amount() * rate / Decimal::ONE_HUNDRED, currency);
            Self {
                net: listed.clone(),
                gross: Money::new(listed.amount() + tax_amount.amount(), currency),
                tax: tax_amount,
            }
        }
    }
}

// ==================== Tier Selection ====================

/// Index of the tier covering `quantity`: the first tier whose bound is at
/// least the quantity, else the last tier
fn select_tier_index(tiers: &[PriceTier], quantity: Decimal) -> Option<usize> {
    if tiers.is_empty() {
        return None;
    }
    let found = tiers.iter().position(|tier| match tier.up_to {
        Some(bound) => quantity <= bound,
        None => true,
    });
    Some(found.unwrap_or(tiers.len() - 1))
}

fn tier_detail(
    quantity: Decimal,
    unit_listed: &Money,
    unit: &TaxedAmount,
    line: &TaxedAmount,
) -> TierDetail {
    TierDetail {
        quantity,
        unit_amount: unit_listed.to_cents(),
        unit_amount_decimal: unit_listed.to_decimal_string(),
        unit_amount_net: unit.net.to_cents(),
        unit_amount_gross: unit.gross.to_cents(),
        amount_subtotal: line.net.to_cents(),
        amount_total: line.gross.to_cents(),
        amount_tax: line.tax.to_cents(),
    }
}

fn result_from(
    unit_listed: Money,
    unit: TaxedAmount,
    line: TaxedAmount,
    details: Vec<TierDetail>,
) -> PriceComputationResult {
    PriceComputationResult {
        unit_amount: unit_listed,
        unit_amount_net: unit.net,
        unit_amount_gross: unit.gross,
        amount_subtotal: line.net,
        amount_total: line.gross,
        amount_tax: line.tax,
        tier_details: Some(details),
    }
}

// ==================== Resolvers ====================

/// Price the whole quantity with one per-unit amount
pub fn compute_per_unit_price(
    unit_amount: &Money,
    multiplier: Decimal,
    is_tax_inclusive: bool,
    tax: &ApplicableTax,
) -> PriceComputationResult {
    let unit = TaxedAmount::split(unit_amount, is_tax_inclusive, tax);
    let line = TaxedAmount::split(&unit_amount.multiply(multiplier), is_tax_inclusive, tax);
    PriceComputationResult {
        unit_amount: unit_amount.clone(),
        unit_amount_net: unit.net,
        unit_amount_gross: unit.gross,
        amount_subtotal: line.net,
        amount_total: line.gross,
        amount_tax: line.tax,
        tier_details: None,
    }
}

/// Volume pricing: the selection quantity picks one tier, whose unit amount
/// prices the whole multiplier quantity
pub fn compute_tiered_volume_price(
    params: &TierPricingParams,
) -> Result<PriceComputationResult, PricingError> {
    let Some(index) = select_tier_index(params.tiers, params.quantity_to_select_tier) else {
        return Ok(PriceComputationResult::zero(params.currency));
    };
    let tier = &params.tiers[index];
    let unit_listed = tier.unit_amount_money(params.currency)?;
    let unit = TaxedAmount::split(&unit_listed, params.is_tax_inclusive, params.tax);
    let line = TaxedAmount::split(
        &unit_listed.multiply(params.unit_amount_multiplier),
        params.is_tax_inclusive,
        params.tax,
    );
    let detail = tier_detail(params.unit_amount_multiplier, &unit_listed, &unit, &line);
    Ok(result_from(unit_listed, unit, line, vec![detail]))
}

/// Graduated pricing: walk the tiers in order, each pricing the slice of
/// the quantity between its bound and the previous one
///
/// # Notes
/// - The listed per-unit amounts in the result come from the highest tier
///   that received a share of the quantity.
/// - A zero quantity still reports the first tier with a zero slice.
pub fn compute_tiered_graduated_price(
    params: &TierPricingParams,
) -> Result<PriceComputationResult, PricingError> {
    if params.tiers.is_empty() {
        return Ok(PriceComputationResult::zero(params.currency));
    }

    let selection = params.quantity_to_select_tier.max(Decimal::ZERO);
    let mut remaining = selection;
    let mut previous_bound = Decimal::ZERO;
    let mut total_listed = Money::zero(params.currency);
    let mut details = Vec::new();
    let mut display_unit: Option<Money> = None;

    for tier in params.tiers {
        let span = match tier.up_to {
            Some(bound) => {
                let span = (bound - previous_bound).max(Decimal::ZERO);
                previous_bound = bound;
                span
            }
            None => remaining,
        };
        let allocation = remaining.min(span);
        let include_empty = details.is_empty() && selection.is_zero();
        if allocation.is_zero() && !include_empty {
            continue;
        }
        remaining -= allocation;

        let unit_listed = tier.unit_amount_money(params.currency)?;
        let line_listed = unit_listed.multiply(allocation);
        total_listed = total_listed.checked_add(&line_listed)?;
        let unit = TaxedAmount::split(&unit_listed, params.is_tax_inclusive, params.tax);
        let line = TaxedAmount::split(&line_listed, params.is_tax_inclusive, params.tax);
        details.push(tier_detail(allocation, &unit_listed, &unit, &line));
        display_unit = Some(unit_listed);

        if remaining.is_zero() {
            break;
        }
    }

    let unit_listed = match display_unit {
        Some(unit) => unit,
        None => params.tiers[0].unit_amount_money(params.currency)?,
    };
    let unit = TaxedAmount::split(&unit_listed, params.is_tax_inclusive, params.tax);
    let line = TaxedAmount::split(&total_listed, params.is_tax_inclusive, params.tax);
    Ok(result_from(unit_listed, unit, line, details))
}

/// Flat-fee pricing: the selection quantity picks one tier and its flat fee
/// is charged once; when the plain quantity picked the tier the fee is
/// charged per unit instead
pub fn compute_tiered_flat_fee_price(
    params: &TierPricingParams,
) -> Result<PriceComputationResult, PricingError> {
    let Some(index) = select_tier_index(params.tiers, params.quantity_to_select_tier) else {
        return Ok(PriceComputationResult::zero(params.currency));
    };
    let tier = &params.tiers[index];
    let fee = tier.flat_fee_money(params.currency)?;
    let line_listed = if params.is_using_price_mapping_to_select_tier {
        fee.clone()
    } else {
        fee.multiply(params.quantity)
    };
    let unit = TaxedAmount::split(&fee, params.is_tax_inclusive, params.tax);
    let line = TaxedAmount::split(&line_listed, params.is_tax_inclusive, params.tax);
    let detail = tier_detail(params.quantity_to_select_tier, &fee, &unit, &line);
    Ok(result_from(fee, unit, line, vec![detail]))
}

// ==================== Tests ====================
