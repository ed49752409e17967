//! Price item computation
//!
//! Takes a line item with its price snapshot and produces a computed copy:
//! - resolved currency and tax treatment
//! - quantity facets (tier selection quantity, unit amount multiplier)
//! - external fee normalization to the price's billing period
//! - pricing model dispatch
//! - at most one applied coupon
//! - integer/decimal output field pairs, populated even when zero

use rust_decimal::prelude::*;

use crate::discounts::{self, CouponApplication, CouponContext};
use crate::error::PricingError;
use crate::frequency::{self, BillingPeriod};
use crate::models::{
    amount_from_parts, ApplicableTax, ExternalFeeMapping, Price, PriceInputMapping, PriceItem,
    PricingModel, RedeemedPromo, Tax, TaxAmount,
};
use crate::money::{Money, DEFAULT_CURRENCY};
use crate::tiers::{self, PriceComputationResult, TierPricingParams};

/// Caller-provided context for one computation
#[derive(Debug, Clone, Default)]
pub struct ComputePriceItemOpts {
    /// Overrides the item quantity
    pub quantity: Option<Decimal>,
    /// Tax override; an empty list makes the item nontaxable
    pub tax: Option<Vec<Tax>>,
    /// Quantity overrides matched to prices by id
    pub price_mappings: Option<Vec<PriceInputMapping>>,
    /// External fee amounts matched to prices by id
    pub external_fee_mappings: Option<Vec<ExternalFeeMapping>>,
    /// Promo codes the customer redeemed
    pub redeemed_promos: Vec<RedeemedPromo>,
    /// Currency when the price does not carry one
    pub default_currency: Option<String>,
}

// ==================== Quantity Facets ====================

#[derive(Debug, Clone)]
struct QuantityFacets {
    /// Item quantity clamped to be non-negative, defaulting to one
    safe_quantity: Decimal,
    quantity_to_select_tier: Decimal,
    unit_amount_multiplier: Decimal,
    is_using_price_mapping_to_select_tier: bool,
}

fn compute_quantities(
    quantity: Option<Decimal>,
    mapping: Option<&PriceInputMapping>,
    price_period: Option<BillingPeriod>,
) -> QuantityFacets {
    let safe_quantity = quantity.unwrap_or(Decimal::ONE).max(Decimal::ZERO);
    match mapping.and_then(|mapping| mapping.value.map(|value| (mapping, value))) {
        Some((mapping, value)) => {
            let from = mapping.frequency_unit.as_deref().and_then(BillingPeriod::parse);
            let normalized = frequency::normalize_numeric(value, from, price_period);
            QuantityFacets {
                safe_quantity,
                quantity_to_select_tier: normalized,
                unit_amount_multiplier: normalized * safe_quantity,
                is_using_price_mapping_to_select_tier: true,
            }
        }
        None => QuantityFacets {
            safe_quantity,
            quantity_to_select_tier: safe_quantity,
            unit_amount_multiplier: safe_quantity,
            is_using_price_mapping_to_select_tier: false,
        },
    }
}

// ==================== Resolution ====================

fn resolve_currency(price: &Price, opts: &ComputePriceItemOpts) -> String {
    price
        .unit_amount_currency
        .as_deref()
        .or(opts.default_currency.as_deref())
        .unwrap_or(DEFAULT_CURRENCY)
        .to_uppercase()
}

/// Resolve the tax treatment: explicit override first, then the item's
/// taxes, then the price's tax list. An empty list at any step means
/// deliberately nontaxable and stops the chain.
fn resolve_applicable_tax(
    override_tax: Option<&[Tax]>,
    item_taxes: Option<&[TaxAmount]>,
    price_tax: Option<&[Tax]>,
) -> ApplicableTax {
    if let Some(taxes) = override_tax {
        return match taxes.first() {
            Some(tax) => ApplicableTax::Rate(tax.clone()),
            None => ApplicableTax::Nontaxable,
        };
    }
    if let Some(entries) = item_taxes {
        return match entries.first().and_then(|entry| entry.tax.clone()) {
            Some(tax) => ApplicableTax::Rate(tax),
            None => ApplicableTax::Nontaxable,
        };
    }
    if let Some(taxes) = price_tax {
        return match taxes.first() {
            Some(tax) => ApplicableTax::Rate(tax.clone()),
            None => ApplicableTax::Nontaxable,
        };
    }
    ApplicableTax::Unspecified
}

/// A mapping without a price id applies to any price
fn mapping_matches(mapping_price_id: Option<&str>, price_id: Option<&str>) -> bool {
    match (mapping_price_id, price_id) {
        (Some(mapped), Some(target)) => mapped == target,
        (None, _) => true,
        _ => false,
    }
}

fn find_price_mapping<'a>(
    mappings: Option<&'a [PriceInputMapping]>,
    price: &Price,
    item: &PriceItem,
) -> Option<&'a PriceInputMapping> {
    let price_id = price.id.as_deref().or(item.price_id.as_deref());
    mappings?
        .iter()
        .find(|mapping| mapping_matches(mapping.price_id.as_deref(), price_id))
}

fn find_external_fee_mapping<'a>(
    mappings: Option<&'a [ExternalFeeMapping]>,
    price: &Price,
    item: &PriceItem,
) -> Option<&'a ExternalFeeMapping> {
    let price_id = price.id.as_deref().or(item.price_id.as_deref());
    mappings?
        .iter()
        .find(|mapping| mapping_matches(mapping.price_id.as_deref(), price_id))
}

// ==================== External Fees ====================

/// Normalize an external fee from the external system's billing period to
/// the price's. A price without a billing period gets the fee as-is.
fn normalize_external_fee(
    mapping: Option<&ExternalFeeMapping>,
    price: &Price,
) -> Result<Option<String>, PricingError> {
    let Some(mapping) = mapping else {
        return Ok(None);
    };
    let Some(amount) = mapping.amount_total_decimal.as_deref() else {
        return Ok(None);
    };
    if price.billing_period.is_none() {
        return Ok(Some(amount.to_string()));
    }
    let from = mapping.frequency_unit.as_deref().and_then(BillingPeriod::parse);
    let normalized = frequency::normalize_decimal_str(amount, from, price.billing_period_parsed())?;
    Ok(Some(normalized.normalize().to_string()))
}

// ==================== Unit Amount Source ====================

/// The per-unit amount a computation starts from. Items discounted by a
/// previous run restore their pre-discount unit amount so recomputation
/// cannot apply the discount twice.
fn effective_unit_amount(
    item: &PriceItem,
    price: &Price,
    currency: &str,
) -> Result<Money, PricingError> {
    if item.is_discounted() {
        return amount_from_parts(
            item.before_discount_unit_amount,
            item.before_discount_unit_amount_decimal.as_deref(),
            currency,
        );
    }
    if item.unit_amount.is_some() || item.unit_amount_decimal.is_some() {
        return amount_from_parts(item.unit_amount, item.unit_amount_decimal.as_deref(), currency);
    }
    amount_from_parts(price.unit_amount, price.unit_amount_decimal.as_deref(), currency)
}

// ==================== Model Dispatch ====================

fn dispatch_pricing_model(
    price: &Price,
    item: &PriceItem,
    facets: &QuantityFacets,
    external_fee: Option<&str>,
    currency: &str,
    tax: &ApplicableTax,
) -> Result<PriceComputationResult, PricingError> {
    let params = TierPricingParams {
        tiers: price.tiers.as_deref().unwrap_or(&[]),
        quantity_to_select_tier: facets.quantity_to_select_tier,
        unit_amount_multiplier: facets.unit_amount_multiplier,
        quantity: facets.safe_quantity,
        is_using_price_mapping_to_select_tier: facets.is_using_price_mapping_to_select_tier,
        currency,
        is_tax_inclusive: price.is_tax_inclusive,
        tax,
    };
    match price.pricing_model {
        PricingModel::PerUnit => {
            let unit = effective_unit_amount(item, price, currency)?;
            Ok(tiers::compute_per_unit_price(
                &unit,
                facets.unit_amount_multiplier,
                price.is_tax_inclusive,
                tax,
            ))
        }
        PricingModel::TieredVolume => tiers::compute_tiered_volume_price(&params),
        PricingModel::TieredGraduated => tiers::compute_tiered_graduated_price(&params),
        PricingModel::TieredFlatFee => tiers::compute_tiered_flat_fee_price(&params),
        PricingModel::ExternalDynamicTariff | PricingModel::ExternalGetAg => {
            let unit = match external_fee {
                Some(amount) => Money::from_decimal_str(amount, currency)?,
                None => effective_unit_amount(item, price, currency)?,
            };
            Ok(tiers::compute_per_unit_price(
                &unit,
                facets.unit_amount_multiplier,
                price.is_tax_inclusive,
                tax,
            ))
        }
    }
}

// ==================== Main Entry ====================

/// Compute every monetary field of one line item
///
/// # Arguments
/// * `item` - Line item carrying its price snapshot, quantity, and coupons
/// * `opts` - Caller context: overrides, mappings, redeemed promos
///
/// # Calculation Steps
/// 1. Resolve the currency (price, then caller default, then EUR)
/// 2. Resolve the tax treatment (override, item taxes, price tax)
/// 3. Derive quantity facets from the matching price mapping
/// 4. Normalize any external fee to the price's billing period
/// 5. Dispatch on the pricing model
/// 6. Select and apply at most one coupon
/// 7. Emit integer/decimal field pairs; zero results stay populated
///
/// # Returns
/// A new item with all computed fields set; the input is not modified.
pub fn compute_price_item(
    item: &PriceItem,
    opts: &ComputePriceItemOpts,
) -> Result<PriceItem, PricingError> {
    if item.is_composite() {
        return compute_composite_price_item(item, opts);
    }

    let fallback = Price::default();
    let price = item.price.as_ref().unwrap_or(&fallback);

    let currency = resolve_currency(price, opts);
    let tax = resolve_applicable_tax(
        opts.tax.as_deref(),
        item.taxes.as_deref(),
        price.tax.as_deref(),
    );

    let quantity = opts.quantity.or(item.quantity);
    let mapping = find_price_mapping(opts.price_mappings.as_deref(), price, item);
    let facets = compute_quantities(quantity, mapping, price.billing_period_parsed());

    let external_mapping =
        find_external_fee_mapping(opts.external_fee_mappings.as_deref(), price, item);
    let external_fee = normalize_external_fee(external_mapping, price)?;

    let result = dispatch_pricing_model(
        price,
        item,
        &facets,
        external_fee.as_deref(),
        &currency,
        &tax,
    )?;

    let coupons = item.coupons.as_deref().unwrap_or(&[]);
    let application = match discounts::select_coupon(coupons, &opts.redeemed_promos) {
        Some(coupon) => {
            let multiplier = if price.pricing_model == PricingModel::TieredFlatFee {
                facets.safe_quantity
            } else {
                facets.unit_amount_multiplier
            };
            let ctx = CouponContext {
                multiplier,
                is_tax_inclusive: price.is_tax_inclusive,
                tax: &tax,
                currency: &currency,
            };
            Some(discounts::apply_coupon(&result, coupon, &ctx)?)
        }
        None => None,
    };

    build_computed_item(item, price, quantity, &currency, &tax, result, application)
}

/// Compute a composite item: each component computes against its own price
/// and the parent carries the summed amounts
pub fn compute_composite_price_item(
    item: &PriceItem,
    opts: &ComputePriceItemOpts,
) -> Result<PriceItem, PricingError> {
    let components = item.item_components.as_deref().unwrap_or(&[]);
    let mut computed_components = Vec::with_capacity(components.len());
    for component in components {
        computed_components.push(compute_price_item(component, opts)?);
    }

    let fallback = Price::default();
    let price = item.price.as_ref().unwrap_or(&fallback);
    let currency = computed_components
        .iter()
        .find_map(|component| component.currency.clone())
        .unwrap_or_else(|| resolve_currency(price, opts));

    let mut subtotal = Money::zero(&currency);
    let mut total = Money::zero(&currency);
    let mut tax_total = Money::zero(&currency);
    for component in &computed_components {
        let component_currency = component.currency.as_deref().unwrap_or(&currency);
        subtotal = subtotal.checked_add(&amount_from_parts(
            component.amount_subtotal,
            component.amount_subtotal_decimal.as_deref(),
            component_currency,
        )?)?;
        total = total.checked_add(&amount_from_parts(
            component.amount_total,
            component.amount_total_decimal.as_deref(),
            component_currency,
        )?)?;
        tax_total = tax_total.checked_add(&amount_from_parts(
            component.amount_tax,
            component.amount_tax_decimal.as_deref(),
            component_currency,
        )?)?;
    }

    Ok(PriceItem {
        amount_subtotal: Some(subtotal.to_cents()),
        amount_subtotal_decimal: Some(subtotal.to_decimal_string()),
        amount_total: Some(total.to_cents()),
        amount_total_decimal: Some(total.to_decimal_string()),
        amount_tax: Some(tax_total.to_cents()),
        amount_tax_decimal: Some(tax_total.to_decimal_string()),
        currency: Some(currency),
        item_type: price.price_type.clone().or_else(|| item.item_type.clone()),
        billing_period: if price.is_recurring() {
            price.billing_period.clone()
        } else {
            None
        },
        is_tax_inclusive: None,
        unit_amount: None,
        unit_amount_decimal: None,
        unit_amount_net: None,
        unit_amount_gross: None,
        taxes: None,
        tiers_details: None,
        before_discount_unit_amount: None,
        before_discount_unit_amount_decimal: None,
        before_discount_amount_total: None,
        before_discount_amount_total_decimal: None,
        discount_amount: None,
        discount_amount_decimal: None,
        discount_percentage: None,
        cashback_amount: None,
        cashback_amount_decimal: None,
        cashback_period: None,
        after_cashback_amount_total: None,
        after_cashback_amount_total_decimal: None,
        item_components: Some(computed_components),
        ..item.clone()
    })
}

// ==================== Output Assembly ====================

fn build_computed_item(
    item: &PriceItem,
    price: &Price,
    quantity: Option<Decimal>,
    currency: &str,
    tax: &ApplicableTax,
    result: PriceComputationResult,
    application: Option<CouponApplication>,
) -> Result<PriceItem, PricingError> {
    let amounts = application
        .as_ref()
        .map(|application| application.result.clone())
        .unwrap_or(result);
    let coupon = application.as_ref();

    let after_cashback = match coupon.and_then(|application| application.cashback_amount.as_ref()) {
        Some(cashback) => Some(amounts.amount_total.checked_sub(cashback)?.max_zero()),
        None => None,
    };

    let taxes = vec![match tax {
        ApplicableTax::Rate(tax) => TaxAmount {
            tax: Some(tax.clone()),
            amount: amounts.amount_tax.to_cents(),
        },
        _ => TaxAmount { tax: None, amount: 0 },
    }];

    Ok(PriceItem {
        quantity,
        unit_amount: Some(amounts.unit_amount.to_cents()),
        unit_amount_decimal: Some(amounts.unit_amount.to_decimal_string()),
        unit_amount_net: Some(amounts.unit_amount_net.to_cents()),
        unit_amount_gross: Some(amounts.unit_amount_gross.to_cents()),
        amount_subtotal: Some(amounts.amount_subtotal.to_cents()),
        amount_subtotal_decimal: Some(amounts.amount_subtotal.to_decimal_string()),
        amount_total: Some(amounts.amount_total.to_cents()),
        amount_total_decimal: Some(amounts.amount_total.to_decimal_string()),
        amount_tax: Some(amounts.amount_tax.to_cents()),
        amount_tax_decimal: Some(amounts.amount_tax.to_decimal_string()),
        currency: Some(currency.to_string()),
        item_type: price.price_type.clone().or_else(|| item.item_type.clone()),
        billing_period: if price.is_recurring() {
            price.billing_period.clone()
        } else {
            None
        },
        is_tax_inclusive: Some(price.is_tax_inclusive),
        taxes: Some(taxes),
        tiers_details: amounts.tier_details.clone(),
        before_discount_unit_amount: coupon
            .and_then(|a| a.before_discount_unit_amount.as_ref())
            .map(Money::to_cents),
        before_discount_unit_amount_decimal: coupon
            .and_then(|a| a.before_discount_unit_amount.as_ref())
            .map(Money::to_decimal_string),
        before_discount_amount_total: coupon
            .and_then(|a| a.before_discount_amount_total.as_ref())
            .map(Money::to_cents),
        before_discount_amount_total_decimal: coupon
            .and_then(|a| a.before_discount_amount_total.as_ref())
            .map(Money::to_decimal_string),
        discount_amount: coupon.and_then(|a| a.discount_amount.as_ref()).map(Money::to_cents),
        discount_amount_decimal: coupon
            .and_then(|a| a.discount_amount.as_ref())
            .map(Money::to_decimal_string),
        discount_percentage: coupon.and_then(|a| a.discount_percentage),
        cashback_amount: coupon.and_then(|a| a.cashback_amount.as_ref()).map(Money::to_cents),
        cashback_amount_decimal: coupon
            .and_then(|a| a.cashback_amount.as_ref())
            .map(Money::to_decimal_string),
        cashback_period: coupon.and_then(|a| a.cashback_period.clone()),
        after_cashback_amount_total: after_cashback.as_ref().map(Money::to_cents),
        after_cashback_amount_total_decimal: after_cashback.as_ref().map(Money::to_decimal_string),
        ..item.clone()
    })
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coupon, CouponCategory, CouponType, PriceTier};
    use rust_decimal_macros::dec;

    fn make_price(unit_amount_decimal: &str) -> Price {
        Price {
            id: Some("price-1".to_string()),
            unit_amount: Some(
                Money::from_decimal_str(unit_amount_decimal, "EUR").unwrap().to_cents(),
            ),
            unit_amount_decimal: Some(unit_amount_decimal.to_string()),
            ..Default::default()
        }
    }

    fn make_item(price: Price) -> PriceItem {
        PriceItem {
            id: Some("item-1".to_string()),
            price_id: price.id.clone(),
            price: Some(price),
            ..Default::default()
        }
    }

    fn vat(rate: Decimal) -> Tax {
        Tax {
            id: Some("tax-1".to_string()),
            rate,
            tax_type: Some("VAT".to_string()),
        }
    }

    fn graduated_price() -> Price {
        Price {
            pricing_model: PricingModel::TieredGraduated,
            tiers: Some(vec![
                PriceTier {
                    up_to: Some(dec!(10)),
                    unit_amount: Some(1000),
                    unit_amount_decimal: Some("10.00".to_string()),
                    ..Default::default()
                },
                PriceTier {
                    up_to: Some(dec!(20)),
                    unit_amount: Some(800),
                    unit_amount_decimal: Some("8.00".to_string()),
                    ..Default::default()
                },
                PriceTier {
                    up_to: None,
                    unit_amount: Some(600),
                    unit_amount_decimal: Some("6.00".to_string()),
                    ..Default::default()
                },
            ]),
            ..make_price("0")
        }
    }

    // ======== Defaults and Resolution ========

    #[test]
    fn test_per_unit_with_defaults() {
        let item = make_item(make_price("10.00"));
        let computed = compute_price_item(&item, &ComputePriceItemOpts::default()).unwrap();

        assert_eq!(computed.amount_total, Some(1000), "quantity defaults to one");
        assert_eq!(computed.amount_subtotal, Some(1000));
        assert_eq!(computed.amount_tax, Some(0));
        assert_eq!(computed.amount_total_decimal.as_deref(), Some("10"));
        assert_eq!(computed.currency.as_deref(), Some("EUR"));
        assert_eq!(computed.is_tax_inclusive, Some(true));
        assert_eq!(computed.billing_period, None);
        let taxes = computed.taxes.unwrap();
        assert_eq!(taxes.len(), 1);
        assert!(taxes[0].tax.is_none());
        assert_eq!(taxes[0].amount, 0);
    }

    #[test]
    fn test_missing_price_computes_to_zero() {
        let item = PriceItem {
            quantity: Some(dec!(3)),
            ..Default::default()
        };
        let computed = compute_price_item(&item, &ComputePriceItemOpts::default()).unwrap();
        assert_eq!(computed.amount_total, Some(0), "zero results stay populated");
        assert_eq!(computed.amount_total_decimal.as_deref(), Some("0"));
        assert_eq!(computed.amount_subtotal, Some(0));
        assert_eq!(computed.unit_amount, Some(0));
    }

    #[test]
    fn test_negative_quantity_clamps_to_zero() {
        let item = make_item(make_price("10.00"));
        let opts = ComputePriceItemOpts {
            quantity: Some(dec!(-4)),
            ..Default::default()
        };
        let computed = compute_price_item(&item, &opts).unwrap();
        assert_eq!(computed.amount_total, Some(0));
        assert_eq!(computed.unit_amount, Some(1000), "the listed price is untouched");
    }

    #[test]
    fn test_currency_resolution_order() {
        let mut price = make_price("10.00");
        price.unit_amount_currency = Some("usd".to_string());
        let computed =
            compute_price_item(&make_item(price), &ComputePriceItemOpts::default()).unwrap();
        assert_eq!(computed.currency.as_deref(), Some("USD"));

        let opts = ComputePriceItemOpts {
            default_currency: Some("gbp".to_string()),
            ..Default::default()
        };
        let computed = compute_price_item(&make_item(make_price("10.00")), &opts).unwrap();
        assert_eq!(computed.currency.as_deref(), Some("GBP"));
    }

    #[test]
    fn test_tax_resolution_order() {
        let mut price = make_price("100");
        price.tax = Some(vec![vat(dec!(19))]);
        price.is_tax_inclusive = false;

        // Price tax applies on its own
        let computed =
            compute_price_item(&make_item(price.clone()), &ComputePriceItemOpts::default())
                .unwrap();
        assert_eq!(computed.amount_tax, Some(1900));

        // Item taxes beat the price tax
        let mut item = make_item(price.clone());
        item.taxes = Some(vec![TaxAmount {
            tax: Some(vat(dec!(7))),
            amount: 0,
        }]);
        let computed = compute_price_item(&item, &ComputePriceItemOpts::default()).unwrap();
        assert_eq!(computed.amount_tax, Some(700));

        // The explicit override beats both
        let opts = ComputePriceItemOpts {
            tax: Some(vec![vat(dec!(10))]),
            ..Default::default()
        };
        let computed = compute_price_item(&item, &opts).unwrap();
        assert_eq!(computed.amount_tax, Some(1000));

        // An empty override means nontaxable
        let opts = ComputePriceItemOpts {
            tax: Some(Vec::new()),
            ..Default::default()
        };
        let computed = compute_price_item(&item, &opts).unwrap();
        assert_eq!(computed.amount_tax, Some(0));
        assert_eq!(computed.amount_total, Some(10000));
        assert!(computed.taxes.unwrap()[0].tax.is_none());
    }

    #[test]
    fn test_recurring_emits_billing_period() {
        let mut price = make_price("10.00");
        price.price_type = Some("recurring".to_string());
        price.billing_period = Some("monthly".to_string());
        let computed =
            compute_price_item(&make_item(price), &ComputePriceItemOpts::default()).unwrap();
        assert_eq!(computed.item_type.as_deref(), Some("recurring"));
        assert_eq!(computed.billing_period.as_deref(), Some("monthly"));
    }

    #[test]
    fn test_unknown_type_passes_through_without_billing_period() {
        let mut price = make_price("10.00");
        price.price_type = Some("usage_based".to_string());
        price.billing_period = Some("monthly".to_string());
        let computed =
            compute_price_item(&make_item(price), &ComputePriceItemOpts::default()).unwrap();
        assert_eq!(computed.item_type.as_deref(), Some("usage_based"));
        assert_eq!(computed.billing_period, None, "only recurring items carry one");
    }

    // ======== Price Mappings ========

    #[test]
    fn test_price_mapping_normalized_to_price_period() {
        let mut price = graduated_price();
        price.billing_period = Some("monthly".to_string());
        let item = make_item(price);
        let opts = ComputePriceItemOpts {
            price_mappings: Some(vec![PriceInputMapping {
                price_id: Some("price-1".to_string()),
                value: Some(dec!(120)),
                frequency_unit: Some("yearly".to_string()),
            }]),
            ..Default::default()
        };
        let computed = compute_price_item(&item, &opts).unwrap();
        // 120 per year is 10 per month; the first tier covers all of it
        assert_eq!(computed.amount_total, Some(10000));
        let details = computed.tiers_details.unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].quantity, dec!(10));
    }

    #[test]
    fn test_price_mapping_with_unknown_frequency_is_identity() {
        let item = make_item(graduated_price());
        let opts = ComputePriceItemOpts {
            price_mappings: Some(vec![PriceInputMapping {
                price_id: Some("price-1".to_string()),
                value: Some(dec!(15)),
                frequency_unit: Some("per_use".to_string()),
            }]),
            ..Default::default()
        };
        let computed = compute_price_item(&item, &opts).unwrap();
        let details = computed.tiers_details.unwrap();
        assert_eq!(
            details.iter().map(|d| d.quantity).collect::<Vec<_>>(),
            vec![dec!(10), dec!(5)]
        );
    }

    #[test]
    fn test_price_mapping_for_other_price_is_ignored() {
        let item = make_item(graduated_price());
        let opts = ComputePriceItemOpts {
            quantity: Some(dec!(2)),
            price_mappings: Some(vec![PriceInputMapping {
                price_id: Some("someone-else".to_string()),
                value: Some(dec!(500)),
                frequency_unit: None,
            }]),
            ..Default::default()
        };
        let computed = compute_price_item(&item, &opts).unwrap();
        assert_eq!(computed.amount_total, Some(2000), "quantity 2 in the first tier");
    }

    // ======== External Fees ========

    fn external_price() -> Price {
        Price {
            pricing_model: PricingModel::ExternalDynamicTariff,
            billing_period: Some("monthly".to_string()),
            ..make_price("5.00")
        }
    }

    #[test]
    fn test_external_fee_normalized_to_price_period() {
        let item = make_item(external_price());
        let opts = ComputePriceItemOpts {
            external_fee_mappings: Some(vec![ExternalFeeMapping {
                price_id: Some("price-1".to_string()),
                frequency_unit: Some("yearly".to_string()),
                amount_total_decimal: Some("120".to_string()),
            }]),
            ..Default::default()
        };
        let computed = compute_price_item(&item, &opts).unwrap();
        assert_eq!(computed.unit_amount, Some(1000), "120 per year is 10 per month");
        assert_eq!(computed.amount_total, Some(1000));
        assert_eq!(computed.unit_amount_decimal.as_deref(), Some("10"));
    }

    #[test]
    fn test_external_fee_unnormalized_without_price_period() {
        let mut price = external_price();
        price.billing_period = None;
        let item = make_item(price);
        let opts = ComputePriceItemOpts {
            external_fee_mappings: Some(vec![ExternalFeeMapping {
                price_id: Some("price-1".to_string()),
                frequency_unit: Some("yearly".to_string()),
                amount_total_decimal: Some("120".to_string()),
            }]),
            ..Default::default()
        };
        let computed = compute_price_item(&item, &opts).unwrap();
        assert_eq!(computed.amount_total, Some(12000), "no period to normalize into");
    }

    #[test]
    fn test_external_model_without_mapping_uses_price_amount() {
        let item = make_item(external_price());
        let computed = compute_price_item(&item, &ComputePriceItemOpts::default()).unwrap();
        assert_eq!(computed.amount_total, Some(500));
    }

    // ======== Coupons ========

    fn discount_coupon(percentage: Decimal) -> Coupon {
        Coupon {
            id: Some("coupon-1".to_string()),
            name: None,
            category: CouponCategory::Discount,
            coupon_type: CouponType::Percentage,
            percentage_value: Some(percentage),
            fixed_value: None,
            fixed_value_decimal: None,
            fixed_value_currency: None,
            cashback_period: None,
            requires_promo_code: false,
        }
    }

    #[test]
    fn test_discount_coupon_sets_discount_fields() {
        let mut item = make_item(make_price("50.00"));
        item.quantity = Some(dec!(2));
        item.coupons = Some(vec![discount_coupon(dec!(10))]);
        let computed = compute_price_item(&item, &ComputePriceItemOpts::default()).unwrap();

        assert_eq!(computed.amount_total, Some(9000));
        assert_eq!(computed.before_discount_amount_total, Some(10000));
        assert_eq!(computed.before_discount_unit_amount, Some(5000));
        assert_eq!(computed.discount_amount, Some(1000));
        assert_eq!(computed.discount_percentage, Some(dec!(10)));
        assert_eq!(computed.unit_amount, Some(4500));
    }

    #[test]
    fn test_recomputation_is_idempotent() {
        let mut item = make_item(make_price("50.00"));
        item.quantity = Some(dec!(2));
        item.coupons = Some(vec![discount_coupon(dec!(10))]);
        let opts = ComputePriceItemOpts::default();

        let first = compute_price_item(&item, &opts).unwrap();
        let second = compute_price_item(&first, &opts).unwrap();

        assert_eq!(second.amount_total, first.amount_total, "discount is not applied twice");
        assert_eq!(second.unit_amount, first.unit_amount);
        assert_eq!(second.discount_amount, first.discount_amount);
        assert_eq!(second.before_discount_unit_amount, first.before_discount_unit_amount);
    }

    #[test]
    fn test_coupon_removed_on_recomputation_restores_price() {
        let mut item = make_item(make_price("50.00"));
        item.coupons = Some(vec![discount_coupon(dec!(10))]);
        let discounted = compute_price_item(&item, &ComputePriceItemOpts::default()).unwrap();
        assert_eq!(discounted.amount_total, Some(4500));

        let mut without_coupon = discounted;
        without_coupon.coupons = None;
        let recomputed =
            compute_price_item(&without_coupon, &ComputePriceItemOpts::default()).unwrap();
        assert_eq!(recomputed.amount_total, Some(5000));
        assert_eq!(recomputed.discount_amount, None, "stale discount fields are cleared");
        assert_eq!(recomputed.before_discount_unit_amount, None);
    }

    #[test]
    fn test_promo_gated_coupon_applies_only_when_redeemed() {
        let gated = Coupon {
            requires_promo_code: true,
            ..discount_coupon(dec!(10))
        };
        let mut item = make_item(make_price("100"));
        item.coupons = Some(vec![gated.clone()]);

        let computed = compute_price_item(&item, &ComputePriceItemOpts::default()).unwrap();
        assert_eq!(computed.amount_total, Some(10000), "locked coupon is ignored");

        let opts = ComputePriceItemOpts {
            redeemed_promos: vec![RedeemedPromo {
                code: Some("SUMMER".to_string()),
                coupons: vec![gated],
            }],
            ..Default::default()
        };
        let computed = compute_price_item(&item, &opts).unwrap();
        assert_eq!(computed.amount_total, Some(9000));
    }

    #[test]
    fn test_cashback_coupon_keeps_total_and_records_payout() {
        let coupon = Coupon {
            category: CouponCategory::Cashback,
            coupon_type: CouponType::Fixed,
            percentage_value: None,
            fixed_value: Some(2000),
            fixed_value_decimal: Some("20.00".to_string()),
            ..discount_coupon(dec!(0))
        };
        let mut item = make_item(make_price("100.00"));
        item.coupons = Some(vec![coupon]);
        let computed = compute_price_item(&item, &ComputePriceItemOpts::default()).unwrap();

        assert_eq!(computed.amount_total, Some(10000), "cashback does not reduce the total");
        assert_eq!(computed.cashback_amount, Some(2000));
        assert_eq!(computed.cashback_period.as_deref(), Some("0"));
        assert_eq!(computed.after_cashback_amount_total, Some(8000));
        assert_eq!(computed.after_cashback_amount_total_decimal.as_deref(), Some("80"));
    }

    // ======== Composite Items ========

    #[test]
    fn test_composite_item_sums_components() {
        let mut base_fee = make_item(make_price("10.00"));
        base_fee.id = Some("component-1".to_string());
        let mut usage = make_item(Price {
            id: Some("price-2".to_string()),
            price_type: Some("recurring".to_string()),
            billing_period: Some("monthly".to_string()),
            ..make_price("5.00")
        });
        usage.id = Some("component-2".to_string());
        usage.price_id = Some("price-2".to_string());
        usage.quantity = Some(dec!(3));

        let composite = PriceItem {
            id: Some("bundle".to_string()),
            item_components: Some(vec![base_fee, usage]),
            ..Default::default()
        };
        let computed = compute_price_item(&composite, &ComputePriceItemOpts::default()).unwrap();

        assert_eq!(computed.amount_total, Some(2500), "10 plus 3 * 5");
        assert_eq!(computed.amount_subtotal, Some(2500));
        assert_eq!(computed.currency.as_deref(), Some("EUR"));
        let components = computed.item_components.unwrap();
        assert_eq!(components.len(), 2);
        assert_eq!(components[0].amount_total, Some(1000));
        assert_eq!(components[1].amount_total, Some(1500));
        assert_eq!(components[1].billing_period.as_deref(), Some("monthly"));
    }
}
